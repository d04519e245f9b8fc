/// Searchable, paginated table used by every resource page.
use std::rc::Rc;

use leptos::*;
use serde::Serialize;

use crate::table::{cell_text, TableState, DEFAULT_PAGE_SIZE};

/// One column: the record field it shows and its header.
pub struct Column<T> {
    pub key: &'static str,
    pub label: &'static str,
    render: Option<Rc<dyn Fn(&T) -> View>>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            label: self.label,
            render: self.render.clone(),
        }
    }
}

impl<T: Serialize> Column<T> {
    pub fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            render: None,
        }
    }

    /// Replaces the default text cell.
    pub fn render(mut self, render: impl Fn(&T) -> View + 'static) -> Self {
        self.render = Some(Rc::new(render));
        self
    }

    fn cell(&self, row: &T) -> View {
        match &self.render {
            Some(render) => render(row),
            None => cell_text(row, self.key).into_view(),
        }
    }
}

/// Buttons rendered in the last column of each row.
pub type RowActions<T> = Rc<dyn Fn(&T) -> View>;

#[component]
pub fn DataTable<T>(
    #[prop(into)] rows: Signal<Vec<T>>,
    columns: Vec<Column<T>>,
    #[prop(optional)] actions: Option<RowActions<T>>,
    #[prop(default = DEFAULT_PAGE_SIZE)] page_size: usize,
    #[prop(optional, into)] loading: MaybeSignal<bool>,
) -> impl IntoView
where
    T: Serialize + Clone + 'static,
{
    let state = create_rw_signal(TableState::new(page_size));
    let columns = Rc::new(columns);
    let span = columns.len() + usize::from(actions.is_some());

    // Page numbers for the footer, recomputed when rows or search change.
    let summary = create_memo(move |_| {
        rows.with(|rows| {
            state.with(|s| {
                let view = s.view(rows);
                (
                    view.page,
                    view.total_pages,
                    view.first_row,
                    view.last_row(),
                    view.total_matches,
                )
            })
        })
    });

    let header = {
        let columns = columns.clone();
        let has_actions = actions.is_some();
        move || {
            view! {
                <tr>
                    {columns.iter().map(|c| view! { <th>{c.label}</th> }).collect_view()}
                    {has_actions.then(|| view! { <th>"Actions"</th> })}
                </tr>
            }
        }
    };

    let body = move || {
        if loading.get() {
            return view! { <tr><td colspan=span class="muted">"Loading..."</td></tr> }.into_view();
        }
        rows.with(|rows| {
            state.with(|s| {
                let view = s.view(rows);
                if view.rows.is_empty() {
                    return view! { <tr><td colspan=span class="muted">"No records found"</td></tr> }
                        .into_view();
                }
                view.rows
                    .into_iter()
                    .map(|row| {
                        view! {
                            <tr>
                                {columns.iter().map(|c| view! { <td>{c.cell(row)}</td> }).collect_view()}
                                {actions.as_ref().map(|actions| view! { <td class="actions">{actions(row)}</td> })}
                            </tr>
                        }
                    })
                    .collect_view()
            })
        })
    };

    view! {
        <div class="data-table">
            <input
                type="search"
                class="table-search"
                placeholder="Search..."
                prop:value=move || state.with(|s| s.search().to_string())
                on:input=move |ev| state.update(|s| s.set_search(event_target_value(&ev)))
            />
            <table class="table">
                <thead>{header}</thead>
                <tbody>{body}</tbody>
            </table>
            <div class="pagination">
                <span>
                    {move || {
                        let (_, _, first, last, total) = summary.get();
                        format!("{first}-{last} of {total}")
                    }}
                </span>
                <button
                    disabled=move || summary.get().0 <= 1
                    on:click=move |_| {
                        let page = summary.get_untracked().0;
                        state.update(|s| s.set_page(page.saturating_sub(1)));
                    }
                >
                    "Prev"
                </button>
                <span>
                    {move || {
                        let (page, pages, ..) = summary.get();
                        format!("Page {} of {}", page, pages.max(1))
                    }}
                </span>
                <button
                    disabled=move || { let (page, pages, ..) = summary.get(); page >= pages }
                    on:click=move |_| {
                        let (page, pages, ..) = summary.get_untracked();
                        state.update(|s| {
                            s.set_page(page);
                            s.next_page(pages);
                        });
                    }
                >
                    "Next"
                </button>
            </div>
        </div>
    }
}
