#[cfg(feature = "ssr")]
mod db_impl {
    use std::fmt::Display;
    use std::str::FromStr;
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use leptos::logging::log;
    use rusqlite::types::Type;
    use rusqlite::{params, Connection, Error, OptionalExtension, Row};
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use crate::models::category::{Category, CategoryInput};
    use crate::models::gift_box::{GiftBox, GiftBoxInput, GiftBoxItem};
    use crate::models::order::{
        order_totals, CustomerRef, Order, OrderInput, OrderStatus, StatusUpdate,
    };
    use crate::models::product::{Product, ProductInput};
    use crate::models::review::{Review, ReviewInput};
    use crate::models::stats::{DashboardStats, StatusCount};
    use crate::models::transaction::{Transaction, TransactionInput, TransactionKind};
    use crate::models::user::{Role, User, UserInput};
    use crate::models::EntityRef;

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::models::order::{OrderItem, ShippingAddress};
        use crate::models::product::Variant;
        use crate::models::Resource;
        use chrono::{Duration, NaiveDate};

        // Helper function to create test database
        async fn create_test_db() -> Database {
            log!("[TEST] Creating in-memory test database");
            let db = Database::new(":memory:").unwrap();
            db.create_schema().await.unwrap();
            db
        }

        async fn seed_user(db: &Database, email: &str, role: Role) -> User {
            let input = UserInput {
                name: "Test User".into(),
                email: email.into(),
                role,
                active: true,
                password: None,
            };
            db.insert_user(&input, "hash").await.unwrap()
        }

        async fn seed_product(db: &Database, name: &str, category_id: Option<String>) -> Product {
            let input = ProductInput {
                name: name.into(),
                price: 9.5,
                stock: 3,
                variants: vec![Variant {
                    name: "250g".into(),
                    price: 4.75,
                    stock: 1,
                }],
                images: vec!["/uploads/a.png".into()],
                category_id,
                ..Default::default()
            };
            db.insert_product(&input).await.unwrap()
        }

        fn address() -> ShippingAddress {
            ShippingAddress {
                full_name: "Lena Park".into(),
                phone: "555-0100".into(),
                line1: "1 Market St".into(),
                line2: None,
                city: "Springfield".into(),
                postal_code: "12345".into(),
                country: "US".into(),
            }
        }

        #[tokio::test]
        async fn test_schema_creation() {
            let db = create_test_db().await;
            let conn = db.conn.lock().await;
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table'")
                .unwrap();
            let tables: Vec<String> = stmt
                .query_map([], |row| row.get(0))
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();

            for table in [
                "users",
                "auth_tokens",
                "categories",
                "products",
                "gift_boxes",
                "reviews",
                "orders",
                "transactions",
            ] {
                assert!(tables.contains(&table.to_string()), "missing {table}");
            }
        }

        #[tokio::test]
        async fn test_product_lifecycle_with_category() {
            let db = create_test_db().await;
            let category = db
                .insert_category(&CategoryInput {
                    name: "Spices".into(),
                    image: None,
                    active: true,
                })
                .await
                .unwrap();

            let product = seed_product(&db, "Saffron", Some(category.id.clone())).await;
            assert_eq!(product.category.as_ref().map(|c| c.name.as_str()), Some("Spices"));
            assert_eq!(product.variants[0].price, 4.75);

            let categories = db.list_categories().await.unwrap();
            assert_eq!(categories[0].product_count, 1);

            let mut input = product.to_input();
            input.name = "Saffron threads".into();
            input.stock = 0;
            let updated = db.update_product(&product.id, &input).await.unwrap().unwrap();
            assert_eq!(updated.name, "Saffron threads");
            assert_eq!(db.stats().await.unwrap().out_of_stock, 1);

            // Removing the category detaches the product instead of deleting it.
            assert!(db.delete_category(&category.id).await.unwrap());
            let product = db.get_product(&product.id).await.unwrap().unwrap();
            assert_eq!(product.category_id, None);
            assert_eq!(product.category, None);

            assert!(db.delete_product(&product.id).await.unwrap());
            assert!(db.list_products().await.unwrap().is_empty());
            assert!(!db.delete_product(&product.id).await.unwrap());
        }

        #[tokio::test]
        async fn test_update_of_missing_row_is_none() {
            let db = create_test_db().await;
            let input = CategoryInput {
                name: "Ghost".into(),
                ..Default::default()
            };
            assert!(db.update_category("nope", &input).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_reviews_follow_their_product() {
            let db = create_test_db().await;
            let pepper = seed_product(&db, "Pepper", None).await;
            let cumin = seed_product(&db, "Cumin", None).await;
            for (product, rating) in [(&pepper, 5), (&pepper, 3), (&cumin, 4)] {
                db.insert_review(&ReviewInput {
                    product_id: product.id.clone(),
                    author_name: "Ravi".into(),
                    rating,
                    comment: "Fresh".into(),
                })
                .await
                .unwrap();
            }

            assert_eq!(db.list_reviews(None).await.unwrap().len(), 3);
            let pepper_reviews = db.list_reviews(Some(&pepper.id)).await.unwrap();
            assert_eq!(pepper_reviews.len(), 2);
            assert_eq!(
                pepper_reviews[0].product.as_ref().map(|p| p.name.as_str()),
                Some("Pepper")
            );

            db.delete_product(&pepper.id).await.unwrap();
            assert_eq!(db.list_reviews(None).await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_gift_box_contents_carry_product_names() {
            let db = create_test_db().await;
            let pepper = seed_product(&db, "Pepper", None).await;
            let gift_box = db
                .insert_gift_box(&GiftBoxInput {
                    name: "Starter kit".into(),
                    price: 25.0,
                    stock: 4,
                    contents: vec![GiftBoxItem {
                        product_id: pepper.id.clone(),
                        quantity: 2,
                        product_name: None,
                    }],
                    ..Default::default()
                })
                .await
                .unwrap();
            assert_eq!(gift_box.contents[0].product_name.as_deref(), Some("Pepper"));
        }

        #[tokio::test]
        async fn test_order_totals_and_free_status_changes() {
            let db = create_test_db().await;
            let customer = seed_user(&db, "buyer@shop.test", Role::Customer).await;
            let order = db
                .insert_order(&OrderInput {
                    user_id: customer.id.clone(),
                    items: vec![OrderItem {
                        product_id: "p1".into(),
                        name: "Pepper".into(),
                        quantity: 3,
                        unit_price: 2.0,
                    }],
                    shipping_fee: 4.0,
                    shipping_address: address(),
                    status: None,
                })
                .await
                .unwrap();
            assert_eq!(order.subtotal, 6.0);
            assert_eq!(order.total, 10.0);
            assert_eq!(order.status, OrderStatus::Confirmed);
            assert_eq!(order.customer.as_ref().map(|c| c.email.as_str()), Some("buyer@shop.test"));

            let delivered = db
                .update_order_status(
                    &order.id,
                    &StatusUpdate {
                        status: OrderStatus::Delivered,
                        note: Some("Left at door".into()),
                    },
                )
                .await
                .unwrap()
                .unwrap();
            assert_eq!(delivered.status, OrderStatus::Delivered);
            assert_eq!(delivered.status_note.as_deref(), Some("Left at door"));

            // No transition graph: going back is accepted.
            let back = db
                .update_order_status(
                    &order.id,
                    &StatusUpdate {
                        status: OrderStatus::Confirmed,
                        note: None,
                    },
                )
                .await
                .unwrap()
                .unwrap();
            assert_eq!(back.status, OrderStatus::Confirmed);
            assert_eq!(back.status_note, None);

            let stats = db.stats().await.unwrap();
            assert_eq!(stats.orders, 1);
            assert_eq!(stats.revenue, 10.0);

            // Cancelled orders stay counted but earn nothing.
            db.update_order_status(
                &order.id,
                &StatusUpdate {
                    status: OrderStatus::Cancelled,
                    note: None,
                },
            )
            .await
            .unwrap();
            let stats = db.stats().await.unwrap();
            assert_eq!(stats.orders, 1);
            assert_eq!(stats.revenue, 0.0);
        }

        #[tokio::test]
        async fn test_tokens_resolve_to_users_until_revoked() {
            let db = create_test_db().await;
            let admin = seed_user(&db, "admin@shop.test", Role::Admin).await;
            db.insert_token("tok", &admin.id).await.unwrap();
            let an_hour_ago = Utc::now() - Duration::hours(1);
            assert_eq!(
                db.user_for_token("tok", an_hour_ago).await.unwrap().map(|u| u.id),
                Some(admin.id.clone())
            );
            db.delete_token("tok").await.unwrap();
            assert!(db.user_for_token("tok", an_hour_ago).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_expired_tokens_are_ignored_and_pruned() {
            let db = create_test_db().await;
            let admin = seed_user(&db, "admin@shop.test", Role::Admin).await;
            db.insert_token("old", &admin.id).await.unwrap();

            // Everything issued up to now is past the cutoff
            let cutoff = Utc::now() + Duration::seconds(1);
            assert!(db.user_for_token("old", cutoff).await.unwrap().is_none());
            assert_eq!(db.prune_tokens(cutoff).await.unwrap(), 1);
            assert_eq!(db.prune_tokens(cutoff).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_email_lookup_ignores_case() {
            let db = create_test_db().await;
            let user = seed_user(&db, "Mixed@Shop.test", Role::Admin).await;
            let (found, hash) = db.find_credentials("mixed@shop.test").await.unwrap().unwrap();
            assert_eq!(found.id, user.id);
            assert_eq!(hash, "hash");
            assert!(db.email_taken("MIXED@shop.test", None).await.unwrap());
            assert!(!db.email_taken("mixed@shop.test", Some(&user.id)).await.unwrap());
        }

        #[tokio::test]
        async fn test_transactions_ledger() {
            let db = create_test_db().await;
            let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
            for (kind, total) in [(TransactionKind::Credit, 80.0), (TransactionKind::Debit, 30.0)] {
                db.insert_transaction(&TransactionInput {
                    date,
                    company_name: "Northwind".into(),
                    items_description: "Bulk cinnamon".into(),
                    quantity: 10,
                    total,
                    kind,
                })
                .await
                .unwrap();
            }
            let ledger = db.list_transactions().await.unwrap();
            assert_eq!(ledger.len(), 2);
            assert_eq!(ledger[0].date, date);
        }
    }

    /// Shared handle to the SQLite file. Clones share one connection.
    #[derive(Debug, Clone)]
    pub struct Database {
        conn: Arc<Mutex<Connection>>,
    }

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
        serde_json::to_string(value).map_err(|e| Error::ToSqlConversionFailure(Box::new(e)))
    }

    fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> Result<T, Error> {
        let text: String = row.get(idx)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn parsed_column<T>(row: &Row<'_>, idx: usize) -> Result<T, Error>
    where
        T: FromStr,
        T::Err: Display,
    {
        let text: String = row.get(idx)?;
        text.parse()
            .map_err(|e: T::Err| Error::FromSqlConversionFailure(idx, Type::Text, e.to_string().into()))
    }

    fn role_column(row: &Row<'_>, idx: usize) -> Result<Role, Error> {
        let text: String = row.get(idx)?;
        Role::parse(&text).ok_or_else(|| {
            Error::FromSqlConversionFailure(idx, Type::Text, format!("unknown role {text}").into())
        })
    }

    fn kind_column(row: &Row<'_>, idx: usize) -> Result<TransactionKind, Error> {
        let text: String = row.get(idx)?;
        TransactionKind::parse(&text).ok_or_else(|| {
            Error::FromSqlConversionFailure(idx, Type::Text, format!("unknown kind {text}").into())
        })
    }

    const USER_COLUMNS: &str = "u.id, u.name, u.email, u.role, u.active, u.created_at";

    fn user_from_row(row: &Row<'_>) -> Result<User, Error> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            role: role_column(row, 3)?,
            active: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    const CATEGORY_SELECT: &str = "SELECT c.id, c.name, c.image, c.active,
            (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id)
        FROM categories c";

    fn category_from_row(row: &Row<'_>) -> Result<Category, Error> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            image: row.get(2)?,
            active: row.get(3)?,
            product_count: row.get(4)?,
        })
    }

    const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.description, p.price, p.stock,
            p.variants, p.images, p.category_id, c.name, p.active, p.created_at
        FROM products p
        LEFT JOIN categories c ON c.id = p.category_id";

    fn product_from_row(row: &Row<'_>) -> Result<Product, Error> {
        let category_id: Option<String> = row.get(7)?;
        let category_name: Option<String> = row.get(8)?;
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            stock: row.get(4)?,
            variants: json_column(row, 5)?,
            images: json_column(row, 6)?,
            category: match (&category_id, category_name) {
                (Some(id), Some(name)) => Some(EntityRef {
                    id: id.clone(),
                    name,
                }),
                _ => None,
            },
            category_id,
            active: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    const GIFT_BOX_SELECT: &str = "SELECT g.id, g.name, g.description, g.price, g.stock,
            g.images, g.contents, g.active, g.created_at
        FROM gift_boxes g";

    fn gift_box_from_row(row: &Row<'_>) -> Result<GiftBox, Error> {
        Ok(GiftBox {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            stock: row.get(4)?,
            images: json_column(row, 5)?,
            contents: json_column(row, 6)?,
            active: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    const REVIEW_SELECT: &str = "SELECT r.id, r.product_id, p.name, r.author_name, r.rating,
            r.comment, r.created_at
        FROM reviews r
        LEFT JOIN products p ON p.id = r.product_id";

    fn review_from_row(row: &Row<'_>) -> Result<Review, Error> {
        let product_id: String = row.get(1)?;
        let product_name: Option<String> = row.get(2)?;
        Ok(Review {
            id: row.get(0)?,
            product: product_name.map(|name| EntityRef {
                id: product_id.clone(),
                name,
            }),
            product_id,
            author_name: row.get(3)?,
            rating: row.get(4)?,
            comment: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    const ORDER_SELECT: &str = "SELECT o.id, o.user_id, u.id, u.name, u.email, o.items,
            o.subtotal, o.shipping_fee, o.total, o.status, o.status_note,
            o.shipping_address, o.created_at, o.updated_at
        FROM orders o
        LEFT JOIN users u ON u.id = o.user_id";

    fn order_from_row(row: &Row<'_>) -> Result<Order, Error> {
        let customer_id: Option<String> = row.get(2)?;
        let customer = match customer_id {
            Some(id) => Some(CustomerRef {
                id,
                name: row.get(3)?,
                email: row.get(4)?,
            }),
            None => None,
        };
        Ok(Order {
            id: row.get(0)?,
            user_id: row.get(1)?,
            customer,
            items: json_column(row, 5)?,
            subtotal: row.get(6)?,
            shipping_fee: row.get(7)?,
            total: row.get(8)?,
            status: parsed_column(row, 9)?,
            status_note: row.get(10)?,
            shipping_address: json_column(row, 11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    const TRANSACTION_SELECT: &str = "SELECT t.id, t.date, t.company_name, t.items_description,
            t.quantity, t.total, t.kind, t.created_at
        FROM transactions t";

    fn transaction_from_row(row: &Row<'_>) -> Result<Transaction, Error> {
        Ok(Transaction {
            id: row.get(0)?,
            date: row.get(1)?,
            company_name: row.get(2)?,
            items_description: row.get(3)?,
            quantity: row.get(4)?,
            total: row.get(5)?,
            kind: kind_column(row, 6)?,
            created_at: row.get(7)?,
        })
    }

    fn query_all<T>(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&Row<'_>) -> Result<T, Error>,
    ) -> Result<Vec<T>, Error> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        rows.collect()
    }

    fn query_one<T>(
        conn: &Connection,
        sql: &str,
        id: &str,
        map: fn(&Row<'_>) -> Result<T, Error>,
    ) -> Result<Option<T>, Error> {
        conn.query_row(sql, [id], map).optional()
    }

    /// Fills `product_name` of every gift box line from the products table.
    fn attach_product_names(conn: &Connection, boxes: &mut [GiftBox]) -> Result<(), Error> {
        let mut stmt = conn.prepare("SELECT name FROM products WHERE id = ?")?;
        for item in boxes.iter_mut().flat_map(|b| b.contents.iter_mut()) {
            item.product_name = stmt
                .query_row([&item.product_id], |row| row.get(0))
                .optional()?;
        }
        Ok(())
    }

    impl Database {
        // Create a new database connection
        pub fn new(db_path: &str) -> Result<Self, Error> {
            let conn = Connection::open(db_path)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            log!("[DB] Connection established at: {}", db_path);
            Ok(Database {
                conn: Arc::new(Mutex::new(conn)),
            })
        }

        // Create the database schema
        pub async fn create_schema(&self) -> Result<(), Error> {
            let conn = self.conn.lock().await;

            // 1. Accounts and their bearer tokens
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    role TEXT NOT NULL CHECK (role IN ('admin', 'customer')),
                    active INTEGER NOT NULL DEFAULT 1,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS auth_tokens (
                    token TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );",
            )
            .map_err(|e| {
                eprintln!("Failed creating account tables: {}", e);
                e
            })?;

            // 2. Catalogue
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS categories (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    image TEXT,
                    active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS products (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    price REAL NOT NULL,
                    stock INTEGER NOT NULL,
                    variants TEXT NOT NULL DEFAULT '[]',
                    images TEXT NOT NULL DEFAULT '[]',
                    category_id TEXT,
                    active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
                );
                CREATE TABLE IF NOT EXISTS gift_boxes (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    price REAL NOT NULL,
                    stock INTEGER NOT NULL,
                    images TEXT NOT NULL DEFAULT '[]',
                    contents TEXT NOT NULL DEFAULT '[]',
                    active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL
                );",
            )
            .map_err(|e| {
                eprintln!("Failed creating catalogue tables: {}", e);
                e
            })?;

            // 3. Reviews
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS reviews (
                    id TEXT PRIMARY KEY,
                    product_id TEXT NOT NULL,
                    author_name TEXT NOT NULL,
                    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    comment TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE CASCADE
                );",
            )
            .map_err(|e| {
                eprintln!("Failed creating reviews table: {}", e);
                e
            })?;

            // 4. Orders keep their user id even after the account is gone
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS orders (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    items TEXT NOT NULL,
                    subtotal REAL NOT NULL,
                    shipping_fee REAL NOT NULL,
                    total REAL NOT NULL,
                    status TEXT NOT NULL,
                    status_note TEXT,
                    shipping_address TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );",
            )
            .map_err(|e| {
                eprintln!("Failed creating orders table: {}", e);
                e
            })?;

            // 5. Manual B2B ledger
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS transactions (
                    id TEXT PRIMARY KEY,
                    date TEXT NOT NULL,
                    company_name TEXT NOT NULL,
                    items_description TEXT NOT NULL DEFAULT '',
                    quantity INTEGER NOT NULL,
                    total REAL NOT NULL,
                    kind TEXT NOT NULL CHECK (kind IN ('debit', 'credit')),
                    created_at TEXT NOT NULL
                );",
            )
            .map_err(|e| {
                eprintln!("Failed creating transactions table: {}", e);
                e
            })?;
            log!("[DB] Schema ready");
            Ok(())
        }

        /// Whether a row with `id` exists in one of the crate's own tables.
        pub async fn exists(&self, table: &'static str, id: &str) -> Result<bool, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)"),
                [id],
                |row| row.get(0),
            )
        }

        async fn delete_by_id(&self, table: &'static str, id: &str) -> Result<bool, Error> {
            let conn = self.conn.lock().await;
            let deleted = conn.execute(&format!("DELETE FROM {table} WHERE id = ?"), [id])?;
            log!("[DB] Deleted {} row(s) from {} for {}", deleted, table, id);
            Ok(deleted > 0)
        }

        // ---- users ----

        pub async fn insert_user(&self, input: &UserInput, password_hash: &str) -> Result<User, Error> {
            let conn = self.conn.lock().await;
            let id = new_id();
            conn.execute(
                "INSERT INTO users (id, name, email, role, active, password_hash, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    &id,
                    input.name.trim(),
                    input.email.trim(),
                    input.role.as_str(),
                    input.active,
                    password_hash,
                    Utc::now()
                ],
            )?;
            log!("[DB] User created: {}", id);
            Self::user_by_id(&conn, &id)?.ok_or(Error::QueryReturnedNoRows)
        }

        fn user_by_id(conn: &Connection, id: &str) -> Result<Option<User>, Error> {
            query_one(
                conn,
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?"),
                id,
                user_from_row,
            )
        }

        pub async fn get_user(&self, id: &str) -> Result<Option<User>, Error> {
            let conn = self.conn.lock().await;
            Self::user_by_id(&conn, id)
        }

        pub async fn list_users(&self) -> Result<Vec<User>, Error> {
            let conn = self.conn.lock().await;
            let users = query_all(
                &conn,
                &format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.created_at DESC, u.rowid DESC"),
                [],
                user_from_row,
            )?;
            log!("[DB] Fetched {} users", users.len());
            Ok(users)
        }

        /// Applies `input`; the password hash only changes when one is given.
        pub async fn update_user(
            &self,
            id: &str,
            input: &UserInput,
            password_hash: Option<&str>,
        ) -> Result<Option<User>, Error> {
            let conn = self.conn.lock().await;
            let changed = conn.execute(
                "UPDATE users SET name = ?, email = ?, role = ?, active = ?,
                    password_hash = COALESCE(?, password_hash)
                WHERE id = ?",
                params![
                    input.name.trim(),
                    input.email.trim(),
                    input.role.as_str(),
                    input.active,
                    password_hash,
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            if !input.active {
                conn.execute("DELETE FROM auth_tokens WHERE user_id = ?", [id])?;
            }
            Self::user_by_id(&conn, id)
        }

        pub async fn set_password(&self, id: &str, password_hash: &str) -> Result<bool, Error> {
            let conn = self.conn.lock().await;
            let changed = conn.execute(
                "UPDATE users SET password_hash = ? WHERE id = ?",
                params![password_hash, id],
            )?;
            Ok(changed > 0)
        }

        pub async fn delete_user(&self, id: &str) -> Result<bool, Error> {
            self.delete_by_id("users", id).await
        }

        /// User and password hash for a login attempt.
        pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(
                &format!(
                    "SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.email = ? COLLATE NOCASE"
                ),
                [email.trim()],
                |row| Ok((user_from_row(row)?, row.get(6)?)),
            )
            .optional()
        }

        pub async fn password_hash(&self, id: &str) -> Result<Option<String>, Error> {
            let conn = self.conn.lock().await;
            conn.query_row("SELECT password_hash FROM users WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()
        }

        pub async fn email_taken(&self, email: &str, except_id: Option<&str>) -> Result<bool, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM users WHERE email = ? COLLATE NOCASE AND (? IS NULL OR id != ?)
                )",
                params![email.trim(), except_id, except_id],
                |row| row.get(0),
            )
        }

        pub async fn count_admins(&self) -> Result<i64, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin' AND active = 1",
                [],
                |row| row.get(0),
            )
        }

        // ---- tokens ----

        pub async fn insert_token(&self, token: &str, user_id: &str) -> Result<(), Error> {
            let conn = self.conn.lock().await;
            conn.execute(
                "INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?, ?, ?)",
                params![token, user_id, Utc::now()],
            )?;
            Ok(())
        }

        /// Owner of a token issued after `issued_after`. Older tokens count as unknown.
        pub async fn user_for_token(
            &self,
            token: &str,
            issued_after: DateTime<Utc>,
        ) -> Result<Option<User>, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM auth_tokens t
                    JOIN users u ON u.id = t.user_id
                    WHERE t.token = ? AND t.created_at > ?"
                ),
                params![token, issued_after],
                user_from_row,
            )
            .optional()
        }

        /// Drops every token issued at or before `issued_before`.
        pub async fn prune_tokens(&self, issued_before: DateTime<Utc>) -> Result<usize, Error> {
            let conn = self.conn.lock().await;
            let pruned = conn.execute(
                "DELETE FROM auth_tokens WHERE created_at <= ?",
                params![issued_before],
            )?;
            if pruned > 0 {
                log!("[DB] Pruned {} expired token(s)", pruned);
            }
            Ok(pruned)
        }

        pub async fn delete_token(&self, token: &str) -> Result<(), Error> {
            let conn = self.conn.lock().await;
            conn.execute("DELETE FROM auth_tokens WHERE token = ?", [token])?;
            Ok(())
        }

        // ---- categories ----

        fn category_by_id(conn: &Connection, id: &str) -> Result<Option<Category>, Error> {
            query_one(conn, &format!("{CATEGORY_SELECT} WHERE c.id = ?"), id, category_from_row)
        }

        pub async fn list_categories(&self) -> Result<Vec<Category>, Error> {
            let conn = self.conn.lock().await;
            query_all(
                &conn,
                &format!("{CATEGORY_SELECT} ORDER BY c.created_at DESC, c.rowid DESC"),
                [],
                category_from_row,
            )
        }

        pub async fn get_category(&self, id: &str) -> Result<Option<Category>, Error> {
            let conn = self.conn.lock().await;
            Self::category_by_id(&conn, id)
        }

        pub async fn insert_category(&self, input: &CategoryInput) -> Result<Category, Error> {
            let conn = self.conn.lock().await;
            let id = new_id();
            conn.execute(
                "INSERT INTO categories (id, name, image, active, created_at) VALUES (?, ?, ?, ?, ?)",
                params![&id, input.name.trim(), &input.image, input.active, Utc::now()],
            )?;
            log!("[DB] Category created: {}", id);
            Self::category_by_id(&conn, &id)?.ok_or(Error::QueryReturnedNoRows)
        }

        pub async fn update_category(
            &self,
            id: &str,
            input: &CategoryInput,
        ) -> Result<Option<Category>, Error> {
            let conn = self.conn.lock().await;
            let changed = conn.execute(
                "UPDATE categories SET name = ?, image = ?, active = ? WHERE id = ?",
                params![input.name.trim(), &input.image, input.active, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Self::category_by_id(&conn, id)
        }

        pub async fn delete_category(&self, id: &str) -> Result<bool, Error> {
            self.delete_by_id("categories", id).await
        }

        // ---- products ----

        fn product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>, Error> {
            query_one(conn, &format!("{PRODUCT_SELECT} WHERE p.id = ?"), id, product_from_row)
        }

        pub async fn list_products(&self) -> Result<Vec<Product>, Error> {
            let conn = self.conn.lock().await;
            let products = query_all(
                &conn,
                &format!("{PRODUCT_SELECT} ORDER BY p.created_at DESC, p.rowid DESC"),
                [],
                product_from_row,
            )?;
            log!("[DB] Fetched {} products", products.len());
            Ok(products)
        }

        pub async fn get_product(&self, id: &str) -> Result<Option<Product>, Error> {
            let conn = self.conn.lock().await;
            Self::product_by_id(&conn, id)
        }

        pub async fn insert_product(&self, input: &ProductInput) -> Result<Product, Error> {
            let conn = self.conn.lock().await;
            let id = new_id();
            conn.execute(
                "INSERT INTO products
                    (id, name, description, price, stock, variants, images, category_id, active, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    &id,
                    input.name.trim(),
                    &input.description,
                    input.price,
                    input.stock,
                    to_json(&input.variants)?,
                    to_json(&input.images)?,
                    &input.category_id,
                    input.active,
                    Utc::now()
                ],
            )?;
            log!("[DB] Product created: {}", id);
            Self::product_by_id(&conn, &id)?.ok_or(Error::QueryReturnedNoRows)
        }

        pub async fn update_product(
            &self,
            id: &str,
            input: &ProductInput,
        ) -> Result<Option<Product>, Error> {
            let conn = self.conn.lock().await;
            let changed = conn.execute(
                "UPDATE products SET name = ?, description = ?, price = ?, stock = ?,
                    variants = ?, images = ?, category_id = ?, active = ?
                WHERE id = ?",
                params![
                    input.name.trim(),
                    &input.description,
                    input.price,
                    input.stock,
                    to_json(&input.variants)?,
                    to_json(&input.images)?,
                    &input.category_id,
                    input.active,
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Self::product_by_id(&conn, id)
        }

        pub async fn delete_product(&self, id: &str) -> Result<bool, Error> {
            self.delete_by_id("products", id).await
        }

        // ---- gift boxes ----

        fn gift_box_by_id(conn: &Connection, id: &str) -> Result<Option<GiftBox>, Error> {
            let found = query_one(conn, &format!("{GIFT_BOX_SELECT} WHERE g.id = ?"), id, gift_box_from_row)?;
            match found {
                Some(mut gift_box) => {
                    attach_product_names(conn, std::slice::from_mut(&mut gift_box))?;
                    Ok(Some(gift_box))
                }
                None => Ok(None),
            }
        }

        pub async fn list_gift_boxes(&self) -> Result<Vec<GiftBox>, Error> {
            let conn = self.conn.lock().await;
            let mut boxes = query_all(
                &conn,
                &format!("{GIFT_BOX_SELECT} ORDER BY g.created_at DESC, g.rowid DESC"),
                [],
                gift_box_from_row,
            )?;
            attach_product_names(&conn, &mut boxes)?;
            Ok(boxes)
        }

        pub async fn get_gift_box(&self, id: &str) -> Result<Option<GiftBox>, Error> {
            let conn = self.conn.lock().await;
            Self::gift_box_by_id(&conn, id)
        }

        pub async fn insert_gift_box(&self, input: &GiftBoxInput) -> Result<GiftBox, Error> {
            let conn = self.conn.lock().await;
            let id = new_id();
            conn.execute(
                "INSERT INTO gift_boxes
                    (id, name, description, price, stock, images, contents, active, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    &id,
                    input.name.trim(),
                    &input.description,
                    input.price,
                    input.stock,
                    to_json(&input.images)?,
                    to_json(&stripped_contents(input))?,
                    input.active,
                    Utc::now()
                ],
            )?;
            log!("[DB] Gift box created: {}", id);
            Self::gift_box_by_id(&conn, &id)?.ok_or(Error::QueryReturnedNoRows)
        }

        pub async fn update_gift_box(
            &self,
            id: &str,
            input: &GiftBoxInput,
        ) -> Result<Option<GiftBox>, Error> {
            let conn = self.conn.lock().await;
            let changed = conn.execute(
                "UPDATE gift_boxes SET name = ?, description = ?, price = ?, stock = ?,
                    images = ?, contents = ?, active = ?
                WHERE id = ?",
                params![
                    input.name.trim(),
                    &input.description,
                    input.price,
                    input.stock,
                    to_json(&input.images)?,
                    to_json(&stripped_contents(input))?,
                    input.active,
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Self::gift_box_by_id(&conn, id)
        }

        pub async fn delete_gift_box(&self, id: &str) -> Result<bool, Error> {
            self.delete_by_id("gift_boxes", id).await
        }

        // ---- reviews ----

        fn review_by_id(conn: &Connection, id: &str) -> Result<Option<Review>, Error> {
            query_one(conn, &format!("{REVIEW_SELECT} WHERE r.id = ?"), id, review_from_row)
        }

        /// All reviews, or only those of `product_id`.
        pub async fn list_reviews(&self, product_id: Option<&str>) -> Result<Vec<Review>, Error> {
            let conn = self.conn.lock().await;
            query_all(
                &conn,
                &format!(
                    "{REVIEW_SELECT} WHERE (?1 IS NULL OR r.product_id = ?1)
                    ORDER BY r.created_at DESC, r.rowid DESC"
                ),
                params![product_id],
                review_from_row,
            )
        }

        pub async fn get_review(&self, id: &str) -> Result<Option<Review>, Error> {
            let conn = self.conn.lock().await;
            Self::review_by_id(&conn, id)
        }

        pub async fn insert_review(&self, input: &ReviewInput) -> Result<Review, Error> {
            let conn = self.conn.lock().await;
            let id = new_id();
            conn.execute(
                "INSERT INTO reviews (id, product_id, author_name, rating, comment, created_at)
                VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    &id,
                    &input.product_id,
                    input.author_name.trim(),
                    input.rating,
                    &input.comment,
                    Utc::now()
                ],
            )?;
            Self::review_by_id(&conn, &id)?.ok_or(Error::QueryReturnedNoRows)
        }

        pub async fn update_review(
            &self,
            id: &str,
            input: &ReviewInput,
        ) -> Result<Option<Review>, Error> {
            let conn = self.conn.lock().await;
            let changed = conn.execute(
                "UPDATE reviews SET product_id = ?, author_name = ?, rating = ?, comment = ?
                WHERE id = ?",
                params![
                    &input.product_id,
                    input.author_name.trim(),
                    input.rating,
                    &input.comment,
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Self::review_by_id(&conn, id)
        }

        pub async fn delete_review(&self, id: &str) -> Result<bool, Error> {
            self.delete_by_id("reviews", id).await
        }

        // ---- orders ----

        fn order_by_id(conn: &Connection, id: &str) -> Result<Option<Order>, Error> {
            query_one(conn, &format!("{ORDER_SELECT} WHERE o.id = ?"), id, order_from_row)
        }

        pub async fn list_orders(&self) -> Result<Vec<Order>, Error> {
            let conn = self.conn.lock().await;
            let orders = query_all(
                &conn,
                &format!("{ORDER_SELECT} ORDER BY o.created_at DESC, o.rowid DESC"),
                [],
                order_from_row,
            )?;
            log!("[DB] Fetched {} orders", orders.len());
            Ok(orders)
        }

        pub async fn get_order(&self, id: &str) -> Result<Option<Order>, Error> {
            let conn = self.conn.lock().await;
            Self::order_by_id(&conn, id)
        }

        pub async fn insert_order(&self, input: &OrderInput) -> Result<Order, Error> {
            let conn = self.conn.lock().await;
            let id = new_id();
            let now = Utc::now();
            let (subtotal, total) = order_totals(&input.items, input.shipping_fee);
            conn.execute(
                "INSERT INTO orders
                    (id, user_id, items, subtotal, shipping_fee, total, status, status_note,
                     shipping_address, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?)",
                params![
                    &id,
                    &input.user_id,
                    to_json(&input.items)?,
                    subtotal,
                    input.shipping_fee,
                    total,
                    input.status.unwrap_or_default().label(),
                    to_json(&input.shipping_address)?,
                    now,
                    now
                ],
            )?;
            log!("[DB] Order created: {} total {:.2}", id, total);
            Self::order_by_id(&conn, &id)?.ok_or(Error::QueryReturnedNoRows)
        }

        /// Overwrites status and note. Any status may follow any other.
        pub async fn update_order_status(
            &self,
            id: &str,
            update: &StatusUpdate,
        ) -> Result<Option<Order>, Error> {
            let conn = self.conn.lock().await;
            let changed = conn.execute(
                "UPDATE orders SET status = ?, status_note = ?, updated_at = ? WHERE id = ?",
                params![update.status.label(), update.normalized_note(), Utc::now(), id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            log!("[DB] Order {} set to {}", id, update.status);
            Self::order_by_id(&conn, id)
        }

        pub async fn delete_order(&self, id: &str) -> Result<bool, Error> {
            self.delete_by_id("orders", id).await
        }

        // ---- transactions ----

        fn transaction_by_id(conn: &Connection, id: &str) -> Result<Option<Transaction>, Error> {
            query_one(conn, &format!("{TRANSACTION_SELECT} WHERE t.id = ?"), id, transaction_from_row)
        }

        pub async fn list_transactions(&self) -> Result<Vec<Transaction>, Error> {
            let conn = self.conn.lock().await;
            query_all(
                &conn,
                &format!("{TRANSACTION_SELECT} ORDER BY t.date DESC, t.created_at DESC, t.rowid DESC"),
                [],
                transaction_from_row,
            )
        }

        pub async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, Error> {
            let conn = self.conn.lock().await;
            Self::transaction_by_id(&conn, id)
        }

        pub async fn insert_transaction(&self, input: &TransactionInput) -> Result<Transaction, Error> {
            let conn = self.conn.lock().await;
            let id = new_id();
            conn.execute(
                "INSERT INTO transactions
                    (id, date, company_name, items_description, quantity, total, kind, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    &id,
                    input.date,
                    input.company_name.trim(),
                    &input.items_description,
                    input.quantity,
                    input.total,
                    input.kind.as_str(),
                    Utc::now()
                ],
            )?;
            Self::transaction_by_id(&conn, &id)?.ok_or(Error::QueryReturnedNoRows)
        }

        pub async fn update_transaction(
            &self,
            id: &str,
            input: &TransactionInput,
        ) -> Result<Option<Transaction>, Error> {
            let conn = self.conn.lock().await;
            let changed = conn.execute(
                "UPDATE transactions SET date = ?, company_name = ?, items_description = ?,
                    quantity = ?, total = ?, kind = ?
                WHERE id = ?",
                params![
                    input.date,
                    input.company_name.trim(),
                    &input.items_description,
                    input.quantity,
                    input.total,
                    input.kind.as_str(),
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Self::transaction_by_id(&conn, id)
        }

        pub async fn delete_transaction(&self, id: &str) -> Result<bool, Error> {
            self.delete_by_id("transactions", id).await
        }

        // ---- dashboard ----

        pub async fn stats(&self) -> Result<DashboardStats, Error> {
            let conn = self.conn.lock().await;
            let count = |table: &str| -> Result<i64, Error> {
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            };
            let mut stats = DashboardStats {
                users: count("users")?,
                products: count("products")?,
                categories: count("categories")?,
                gift_boxes: count("gift_boxes")?,
                orders: count("orders")?,
                reviews: count("reviews")?,
                ..Default::default()
            };
            stats.revenue = conn.query_row(
                "SELECT COALESCE(SUM(total), 0.0) FROM orders WHERE status != ?",
                [OrderStatus::Cancelled.label()],
                |row| row.get(0),
            )?;
            stats.out_of_stock =
                conn.query_row("SELECT COUNT(*) FROM products WHERE stock = 0", [], |row| row.get(0))?;

            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM orders GROUP BY status")?;
            let counted = stmt
                .query_map([], |row| {
                    Ok(StatusCount {
                        status: parsed_column(row, 0)?,
                        count: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            // Every label is listed, in workflow order, even with zero orders.
            stats.orders_by_status = OrderStatus::ALL
                .into_iter()
                .map(|status| StatusCount {
                    status,
                    count: counted
                        .iter()
                        .find(|c| c.status == status)
                        .map_or(0, |c| c.count),
                })
                .collect();
            Ok(stats)
        }
    }

    /// Product names are resolved on read, never stored.
    fn stripped_contents(input: &GiftBoxInput) -> Vec<GiftBoxItem> {
        input
            .contents
            .iter()
            .map(|item| GiftBoxItem {
                product_name: None,
                ..item.clone()
            })
            .collect()
    }
}

#[cfg(feature = "ssr")]
pub use db_impl::Database;
