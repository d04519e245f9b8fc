use serde::{Deserialize, Serialize};

use super::order::OrderStatus;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Numbers shown on the dashboard landing page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DashboardStats {
    pub users: i64,
    pub products: i64,
    pub categories: i64,
    pub gift_boxes: i64,
    pub orders: i64,
    pub reviews: i64,
    /// Sum of totals of every order that is not cancelled.
    pub revenue: f64,
    pub orders_by_status: Vec<StatusCount>,
    /// Products with no stock left.
    pub out_of_stock: i64,
}
