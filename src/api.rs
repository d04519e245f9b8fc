//! REST handlers mounted under `/api`.
//!
//! Every handler answers with the JSON envelope: `ApiEnvelope` on success,
//! `ApiError` (rendered by its `ResponseError` impl) on failure.
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use leptos::logging::{log, warn};
use paste::paste;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{self, AdminUser, AuthUser};
use crate::config::ServerConfig;
use crate::db::Database;
use crate::error::ApiError;
use crate::models::category::Category;
use crate::models::envelope::{ApiEnvelope, Deleted, UploadedFile};
use crate::models::gift_box::{GiftBox, GiftBoxInput};
use crate::models::order::{OrderInput, StatusUpdate};
use crate::models::product::{Product, ProductInput};
use crate::models::review::{Review, ReviewInput};
use crate::models::transaction::{Transaction, TransactionSummary};
use crate::models::user::{LoginRequest, PasswordChange, Role, User, UserInput};
use crate::models::{check, Resource};

type Reply = Result<HttpResponse, ApiError>;

fn ok<T: serde::Serialize>(data: T) -> Reply {
    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(data)))
}

fn created<T: serde::Serialize>(data: T) -> Reply {
    Ok(HttpResponse::Created().json(ApiEnvelope::ok(data)))
}

fn deleted(id: String) -> Reply {
    ok(Deleted { id })
}

/// Rejects references to rows that do not exist.
async fn require_row(
    db: &Database,
    table: &'static str,
    id: &str,
    problem: impl FnOnce() -> String,
) -> Result<(), ApiError> {
    if db.exists(table, id).await? {
        Ok(())
    } else {
        Err(ApiError::Validation(vec![problem()]))
    }
}

async fn no_references<I>(_: &Database, _: &I) -> Result<(), ApiError> {
    Ok(())
}

async fn check_product(db: &Database, input: &ProductInput) -> Result<(), ApiError> {
    match input.category_id.as_deref() {
        Some(category_id) => {
            require_row(db, "categories", category_id, || {
                "Category does not exist".to_string()
            })
            .await
        }
        None => Ok(()),
    }
}

async fn check_gift_box(db: &Database, input: &GiftBoxInput) -> Result<(), ApiError> {
    for item in &input.contents {
        require_row(db, "products", &item.product_id, || {
            format!("Product {} does not exist", item.product_id)
        })
        .await?;
    }
    Ok(())
}

async fn check_review(db: &Database, input: &ReviewInput) -> Result<(), ApiError> {
    require_row(db, "products", &input.product_id, || {
        "Product does not exist".to_string()
    })
    .await
}

/// Read, create, update and delete handlers for a resource whose database
/// methods follow the `get_x`, `insert_x`, `update_x`, `delete_x` naming.
/// The `list` form also generates `list_xs`.
macro_rules! crud_handlers {
    (list $one:ident, $many:ident, $model:ty, $check:ident) => {
        paste! {
            pub async fn [<list_ $many>](db: web::Data<Database>, _admin: AdminUser) -> Reply {
                let rows = db.[<list_ $many>]().await?;
                log!("[API] Returning {} {}", rows.len(), stringify!($many));
                ok(rows)
            }
        }
        crud_handlers!($one, $model, $check);
    };
    ($one:ident, $model:ty, $check:ident) => {
        paste! {
            pub async fn [<get_ $one>](
                db: web::Data<Database>,
                _admin: AdminUser,
                id: web::Path<String>,
            ) -> Reply {
                let row = db
                    .[<get_ $one>](&id)
                    .await?
                    .ok_or(ApiError::NotFound(capitalized(<$model as Resource>::LABEL)))?;
                ok(row)
            }

            pub async fn [<create_ $one>](
                db: web::Data<Database>,
                _admin: AdminUser,
                input: web::Json<<$model as Resource>::Input>,
            ) -> Reply {
                let input = input.into_inner();
                check(&input).map_err(ApiError::Validation)?;
                $check(&db, &input).await?;
                let row = db.[<insert_ $one>](&input).await?;
                log!("[API] Created {} {}", <$model as Resource>::LABEL, row.id);
                created(row)
            }

            pub async fn [<update_ $one>](
                db: web::Data<Database>,
                _admin: AdminUser,
                id: web::Path<String>,
                input: web::Json<<$model as Resource>::Input>,
            ) -> Reply {
                let input = input.into_inner();
                check(&input).map_err(ApiError::Validation)?;
                $check(&db, &input).await?;
                let row = db
                    .[<update_ $one>](&id, &input)
                    .await?
                    .ok_or(ApiError::NotFound(capitalized(<$model as Resource>::LABEL)))?;
                log!("[API] Updated {} {}", <$model as Resource>::LABEL, row.id);
                ok(row)
            }

            pub async fn [<delete_ $one>](
                db: web::Data<Database>,
                _admin: AdminUser,
                id: web::Path<String>,
            ) -> Reply {
                let id = id.into_inner();
                if !db.[<delete_ $one>](&id).await? {
                    return Err(ApiError::NotFound(capitalized(<$model as Resource>::LABEL)));
                }
                log!("[API] Deleted {} {}", <$model as Resource>::LABEL, id);
                deleted(id)
            }
        }
    };
}

/// Name used in "... not found" messages.
fn capitalized(label: &'static str) -> &'static str {
    match label {
        "category" => "Category",
        "product" => "Product",
        "gift box" => "Gift box",
        "review" => "Review",
        "transaction" => "Transaction",
        "order" => "Order",
        "user" => "User",
        other => other,
    }
}

crud_handlers!(list category, categories, Category, no_references);
crud_handlers!(list product, products, Product, check_product);
crud_handlers!(list gift_box, gift_boxes, GiftBox, check_gift_box);
crud_handlers!(list transaction, transactions, Transaction, no_references);
crud_handlers!(review, Review, check_review);

// ---- reviews ----

#[derive(Debug, Deserialize)]
pub struct ReviewFilter {
    pub product_id: Option<String>,
}

pub async fn list_reviews(
    db: web::Data<Database>,
    _admin: AdminUser,
    filter: web::Query<ReviewFilter>,
) -> Reply {
    let product_id = filter.product_id.as_deref().filter(|id| !id.is_empty());
    let reviews = db.list_reviews(product_id).await?;
    log!(
        "[API] Returning {} reviews (product filter: {:?})",
        reviews.len(),
        product_id
    );
    ok(reviews)
}

// ---- transactions ----

pub async fn transaction_summary(db: web::Data<Database>, _admin: AdminUser) -> Reply {
    let ledger = db.list_transactions().await?;
    ok(TransactionSummary::of(&ledger))
}

// ---- users ----

pub async fn list_users(db: web::Data<Database>, _admin: AdminUser) -> Reply {
    ok(db.list_users().await?)
}

pub async fn get_user(db: web::Data<Database>, _admin: AdminUser, id: web::Path<String>) -> Reply {
    ok(db.get_user(&id).await?.ok_or(ApiError::NotFound("User"))?)
}

pub async fn create_user(
    db: web::Data<Database>,
    _admin: AdminUser,
    input: web::Json<UserInput>,
) -> Reply {
    let input = input.into_inner();
    let mut problems = check(&input).err().unwrap_or_default();
    let Some(password) = input.password.as_deref() else {
        problems.push("Password is required".to_string());
        return Err(ApiError::Validation(problems));
    };
    if !problems.is_empty() {
        return Err(ApiError::Validation(problems));
    }
    if db.email_taken(&input.email, None).await? {
        return Err(ApiError::Conflict("Email is already in use".to_string()));
    }
    let hash = auth::hash_password(password)?;
    let user = db
        .insert_user(&input, &hash)
        .await
        .map_err(ApiError::email_conflict)?;
    log!("[API] Created user {} ({})", user.id, user.role.as_str());
    created(user)
}

pub async fn update_user(
    db: web::Data<Database>,
    admin: AdminUser,
    id: web::Path<String>,
    input: web::Json<UserInput>,
) -> Reply {
    let input = input.into_inner();
    check(&input).map_err(ApiError::Validation)?;
    // The caller is an active admin, so while they cannot demote themselves
    // at least one active admin always remains.
    if *id == admin.user.id && (input.role != Role::Admin || !input.active) {
        return Err(ApiError::BadRequest(
            "You cannot remove your own admin access".to_string(),
        ));
    }
    if db.email_taken(&input.email, Some(&id)).await? {
        return Err(ApiError::Conflict("Email is already in use".to_string()));
    }
    let hash = input
        .password
        .as_deref()
        .map(auth::hash_password)
        .transpose()?;
    let user = db
        .update_user(&id, &input, hash.as_deref())
        .await
        .map_err(ApiError::email_conflict)?
        .ok_or(ApiError::NotFound("User"))?;
    log!("[API] Updated user {}", user.id);
    ok(user)
}

pub async fn delete_user(
    db: web::Data<Database>,
    admin: AdminUser,
    id: web::Path<String>,
) -> Reply {
    let id = id.into_inner();
    if id == admin.user.id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }
    if !db.delete_user(&id).await? {
        return Err(ApiError::NotFound("User"));
    }
    log!("[API] Deleted user {}", id);
    deleted(id)
}

// ---- orders ----

pub async fn list_orders(db: web::Data<Database>, _admin: AdminUser) -> Reply {
    ok(db.list_orders().await?)
}

pub async fn get_order(db: web::Data<Database>, _admin: AdminUser, id: web::Path<String>) -> Reply {
    ok(db.get_order(&id).await?.ok_or(ApiError::NotFound("Order"))?)
}

pub async fn create_order(
    db: web::Data<Database>,
    _admin: AdminUser,
    input: web::Json<OrderInput>,
) -> Reply {
    let input = input.into_inner();
    check(&input).map_err(ApiError::Validation)?;
    require_row(&db, "users", &input.user_id, || {
        "Customer does not exist".to_string()
    })
    .await?;
    let order = db.insert_order(&input).await?;
    log!("[API] Created order {} for {}", order.id, order.user_id);
    created(order)
}

/// Applies any status to any order; the previous status is not consulted.
pub async fn update_order_status(
    db: web::Data<Database>,
    admin: AdminUser,
    id: web::Path<String>,
    update: web::Json<StatusUpdate>,
) -> Reply {
    let order = db
        .update_order_status(&id, &update)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    log!(
        "[API] {} set order {} to {}",
        admin.user.email,
        order.id,
        order.status
    );
    ok(order)
}

pub async fn delete_order(db: web::Data<Database>, _admin: AdminUser, id: web::Path<String>) -> Reply {
    let id = id.into_inner();
    if !db.delete_order(&id).await? {
        return Err(ApiError::NotFound("Order"));
    }
    deleted(id)
}

// ---- dashboard ----

pub async fn stats(db: web::Data<Database>, _admin: AdminUser) -> Reply {
    ok(db.stats().await?)
}

// ---- auth ----

pub async fn login(db: web::Data<Database>, request: web::Json<LoginRequest>) -> Reply {
    ok(auth::login(&db, &request).await?)
}

/// Revokes the caller's token. Open to every account, admin or not.
pub async fn logout(db: web::Data<Database>, caller: AuthUser) -> Reply {
    db.delete_token(&caller.token).await?;
    log!("[AUTH] {} logged out", caller.user.email);
    ok(serde_json::Value::Null)
}

pub async fn me(admin: AdminUser) -> Reply {
    ok::<User>(admin.user)
}

pub async fn change_password(
    db: web::Data<Database>,
    admin: AdminUser,
    change: web::Json<PasswordChange>,
) -> Reply {
    auth::change_password(&db, &admin.user, &change).await?;
    ok(serde_json::Value::Null)
}

// ---- uploads ----

/// File extension for an accepted image content type.
pub fn image_extension(content_type: &str) -> Option<String> {
    let subtype = content_type.trim().strip_prefix("image/")?;
    let ext = match subtype.split(['+', ';']).next()?.trim() {
        "jpeg" | "pjpeg" => "jpg".to_string(),
        other if !other.is_empty() && other.chars().all(|c| c.is_ascii_alphanumeric()) => {
            other.to_ascii_lowercase()
        }
        _ => return None,
    };
    Some(ext)
}

/// Stores the multipart `file` field under the upload directory.
pub async fn upload(
    config: web::Data<ServerConfig>,
    _admin: AdminUser,
    mut payload: Multipart,
) -> Reply {
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        if field.name() != Some("file") {
            continue;
        }

        // 1. Only images are accepted
        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        let Some(extension) = image_extension(&content_type) else {
            warn!("[UPLOAD] Rejected content type {:?}", content_type);
            return Err(ApiError::Validation(vec![
                "Only image files can be uploaded".to_string(),
            ]));
        };

        // 2. Read the body, enforcing the size limit while streaming
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
        {
            if bytes.len() + chunk.len() > config.max_upload_bytes {
                warn!("[UPLOAD] Rejected file over {} bytes", config.max_upload_bytes);
                return Err(ApiError::TooLarge(config.max_upload_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        // 3. Persist under a generated name
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = config.upload_dir.join(&file_name);
        let size = bytes.len();
        web::block(move || std::fs::write(path, bytes))
            .await
            .map_err(|e| ApiError::Io(std::io::Error::other(e.to_string())))??;

        let url = format!("{}/{}", config.upload_url.trim_end_matches('/'), file_name);
        log!("[UPLOAD] Stored {} ({} bytes)", url, size);
        return created(UploadedFile { url });
    }
    Err(ApiError::BadRequest(
        "Multipart field \"file\" is required".to_string(),
    ))
}

// ---- routing ----

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!("[API] Rejected JSON body: {}", err);
        ApiError::BadRequest(err.to_string()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

/// Registers the `/api` scope. Expects `web::Data<Database>` and
/// `web::Data<ServerConfig>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .app_data(query_config())
            .route("/auth/login", web::post().to(login))
            .route("/auth/logout", web::post().to(logout))
            .route("/auth/me", web::get().to(me))
            .route("/auth/password", web::put().to(change_password))
            .route("/stats", web::get().to(stats))
            .route("/upload", web::post().to(upload))
            .route("/users", web::get().to(list_users))
            .route("/users", web::post().to(create_user))
            .route("/users/{id}", web::get().to(get_user))
            .route("/users/{id}", web::put().to(update_user))
            .route("/users/{id}", web::delete().to(delete_user))
            .route("/categories", web::get().to(list_categories))
            .route("/categories", web::post().to(create_category))
            .route("/categories/{id}", web::get().to(get_category))
            .route("/categories/{id}", web::put().to(update_category))
            .route("/categories/{id}", web::delete().to(delete_category))
            .route("/products", web::get().to(list_products))
            .route("/products", web::post().to(create_product))
            .route("/products/{id}", web::get().to(get_product))
            .route("/products/{id}", web::put().to(update_product))
            .route("/products/{id}", web::delete().to(delete_product))
            .route("/gift-boxes", web::get().to(list_gift_boxes))
            .route("/gift-boxes", web::post().to(create_gift_box))
            .route("/gift-boxes/{id}", web::get().to(get_gift_box))
            .route("/gift-boxes/{id}", web::put().to(update_gift_box))
            .route("/gift-boxes/{id}", web::delete().to(delete_gift_box))
            .route("/reviews", web::get().to(list_reviews))
            .route("/reviews", web::post().to(create_review))
            .route("/reviews/{id}", web::get().to(get_review))
            .route("/reviews/{id}", web::put().to(update_review))
            .route("/reviews/{id}", web::delete().to(delete_review))
            // The summary route must precede `/transactions/{id}`.
            .route("/transactions/summary", web::get().to(transaction_summary))
            .route("/transactions", web::get().to(list_transactions))
            .route("/transactions", web::post().to(create_transaction))
            .route("/transactions/{id}", web::get().to(get_transaction))
            .route("/transactions/{id}", web::put().to(update_transaction))
            .route("/transactions/{id}", web::delete().to(delete_transaction))
            .route("/orders", web::get().to(list_orders))
            .route("/orders", web::post().to(create_order))
            .route("/orders/{id}", web::get().to(get_order))
            .route("/orders/{id}", web::delete().to(delete_order))
            .route("/orders/{id}/status", web::put().to(update_order_status))
            .default_service(web::to(|| async { Err::<HttpResponse, _>(ApiError::NotFound("Route")) })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_types_map_to_extensions() {
        assert_eq!(image_extension("image/png").as_deref(), Some("png"));
        assert_eq!(image_extension("image/jpeg").as_deref(), Some("jpg"));
        assert_eq!(image_extension("image/svg+xml").as_deref(), Some("svg"));
        assert_eq!(image_extension("image/WEBP").as_deref(), Some("webp"));
    }

    #[test]
    fn non_images_are_refused() {
        assert_eq!(image_extension("application/pdf"), None);
        assert_eq!(image_extension("text/html"), None);
        assert_eq!(image_extension("image/"), None);
        assert_eq!(image_extension(""), None);
    }

    #[test]
    fn labels_are_capitalized_for_messages() {
        assert_eq!(capitalized(GiftBox::LABEL), "Gift box");
        assert_eq!(capitalized(Category::LABEL), "Category");
    }
}
