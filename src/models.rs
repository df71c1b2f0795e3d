//! Wire models for the trading backend.
//!
//! Field names follow the backend's camelCase JSON convention.

use serde::{Deserialize, Serialize};

/// Payload of a successful login or registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub token: String,
    pub user_id: String,
    pub username: String,
}

/// A market quote for one symbol.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub last: f64,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// An order as submitted to `/trade/order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTicket {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u32,
    pub price: f64,
}

/// The backend's acknowledgement of a submitted order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: String,
    pub status: String,
}

/// Account summary for the logged-in user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user_id: String,
    pub username: String,
    pub balance: f64,
}
