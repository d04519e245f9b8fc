use std::rc::Rc;

use chrono::NaiveDate;
use leptos::*;

use super::{form_title, money, Editing, FieldErrors, PageState};
use crate::client::ApiClient;
use crate::components::alert_banner::AlertBanner;
use crate::components::data_table::{Column, DataTable, RowActions};
use crate::components::form_fields::{SelectField, TextArea, TextField};
use crate::components::modal::Modal;
use crate::models::transaction::{Transaction, TransactionInput, TransactionKind, TransactionSummary};
use crate::models::{parse_amount, parse_count, Resource};
use crate::session::SessionHandle;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Value of an `<input type="date">`.
pub fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| "Date is required".to_string())
}

fn kind_options() -> Vec<(String, String)> {
    [TransactionKind::Debit, TransactionKind::Credit]
        .into_iter()
        .map(|kind| (kind.as_str().to_string(), super::capitalize(kind.as_str())))
        .collect()
}

#[component]
pub fn TransactionsPage(client: ApiClient, session: SessionHandle) -> impl IntoView {
    let page = PageState::<Transaction>::new(session);
    page.load_on_mount(client.clone());
    let client = store_value(client);
    let page_size = client.with_value(|c| c.config().page_size);

    // Totals follow whatever the last list returned.
    let summary = create_memo(move |_| page.rows.with(|rows| TransactionSummary::of(rows)));

    let date = create_rw_signal(String::new());
    let company_name = create_rw_signal(String::new());
    let items_description = create_rw_signal(String::new());
    let quantity = create_rw_signal(String::new());
    let total = create_rw_signal(String::new());
    let kind = create_rw_signal(TransactionKind::Debit.as_str().to_string());

    let open_form = move |transaction: Option<Transaction>| {
        let input = transaction.as_ref().map(Resource::to_input).unwrap_or_default();
        date.set(input.date.format(DATE_FORMAT).to_string());
        company_name.set(input.company_name);
        items_description.set(input.items_description);
        quantity.set(input.quantity.to_string());
        total.set(if transaction.is_some() { input.total.to_string() } else { String::new() });
        kind.set(input.kind.as_str().to_string());
        match transaction {
            Some(transaction) => page.open_existing(&transaction.id),
            None => page.open_new(),
        }
    };

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let mut errors = FieldErrors::default();
        let input = TransactionInput {
            date: errors.take(parse_date(&date.get_untracked()).map(Some)).unwrap_or_default(),
            company_name: company_name.get_untracked(),
            items_description: items_description.get_untracked(),
            quantity: errors.take(parse_count("Quantity", &quantity.get_untracked())),
            total: errors.take(parse_amount("Total", &total.get_untracked())),
            kind: TransactionKind::parse(&kind.get_untracked()).unwrap_or_default(),
        };
        page.save(client.get_value(), async move {
            errors.finish()?;
            Ok(input)
        });
    };

    let columns = vec![
        Column::new("date", "Date"),
        Column::new("company_name", "Company"),
        Column::new("items_description", "Items"),
        Column::new("quantity", "Qty"),
        Column::new("total", "Total").render(|t: &Transaction| money(t.total).into_view()),
        Column::new("kind", "Type").render(|t: &Transaction| {
            let class = match t.kind {
                TransactionKind::Debit => "badge badge-danger",
                TransactionKind::Credit => "badge badge-success",
            };
            view! { <span class=class>{super::capitalize(t.kind.as_str())}</span> }.into_view()
        }),
    ];
    let actions: RowActions<Transaction> = Rc::new(move |transaction: &Transaction| {
        let editing = transaction.clone();
        let id = transaction.id.clone();
        view! {
            <button class="btn btn-sm" on:click=move |_| open_form(Some(editing.clone()))>"Edit"</button>
            <button class="btn btn-sm btn-danger" on:click=move |_| page.delete(client.get_value(), id.clone())>
                "Delete"
            </button>
        }
        .into_view()
    });

    view! {
        <section class="page">
            <header class="page-header">
                <h2>"Saved transactions"</h2>
                <button class="btn btn-primary" on:click=move |_| open_form(None)>"Add transaction"</button>
            </header>
            <div class="summary-cards">
                <div class="card">
                    <span class="card-label">"Debit"</span>
                    <strong>{move || money(summary.get().debit)}</strong>
                </div>
                <div class="card">
                    <span class="card-label">"Credit"</span>
                    <strong>{move || money(summary.get().credit)}</strong>
                </div>
                <div class="card">
                    <span class="card-label">"Balance"</span>
                    <strong class=move || if summary.get().balance < 0.0 { "negative" } else { "" }>
                        {move || money(summary.get().balance)}
                    </strong>
                </div>
            </div>
            <AlertBanner alert=page.alert />
            <DataTable rows=page.rows columns=columns actions=actions loading=page.loading page_size=page_size />
            <Show when=move || page.editing.with(Editing::is_open)>
                <Modal
                    title=page.editing.with_untracked(form_title::<Transaction>)
                    on_close=move |_| page.close()
                >
                    <form on:submit=submit>
                        <TextField label="Date" value=date kind="date" required=true />
                        <TextField label="Company" value=company_name required=true />
                        <TextArea label="Items" value=items_description />
                        <TextField label="Quantity" value=quantity required=true />
                        <TextField label="Total" value=total required=true />
                        <SelectField label="Type" value=kind options=Signal::derive(kind_options) />
                        <button type="submit" class="btn btn-primary" disabled=move || page.saving.get()>
                            {move || if page.saving.get() { "Saving..." } else { "Save" }}
                        </button>
                    </form>
                </Modal>
            </Show>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_input_value_is_parsed() {
        assert_eq!(
            parse_date("2024-03-09"),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
        assert!(parse_date("").is_err());
        assert!(parse_date("09/03/2024").is_err());
    }

    #[test]
    fn kind_options_match_wire_names() {
        let values: Vec<String> = kind_options().into_iter().map(|(value, _)| value).collect();
        assert_eq!(values, vec!["debit", "credit"]);
    }
}
