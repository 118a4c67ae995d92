//! Input parsing and record formatting for the interactive console.
//!
//! Everything here is pure so that malformed input is rejected, and tested, at
//! the boundary before it reaches a client.

use crate::model::{Order, Shipment, ShipmentId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error("choice {value} is out of range 0..={max}")]
    OutOfRange { value: u32, max: u32 },
    #[error("`{0}` is not a valid price")]
    InvalidPrice(String),
}

/// Main menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Exit,
    CreateOrder,
    ListOrders,
    ListShipments,
    UpdateShipment,
}

/// Target state picked in the status-update dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChoice {
    Packed,
    Shipped,
    Delivered,
}

pub const MENU: &str = "\
=== Order / Shipment Console ===
1. Create order
2. List orders
3. List shipments
4. Update shipment status
0. Exit";

pub const STATUS_MENU: &str = "\
1. Packed
2. Shipped
3. Delivered";

fn parse_number(input: &str) -> Result<u32, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty("choice"));
    }
    trimmed
        .parse()
        .map_err(|_| InputError::NotANumber(trimmed.to_string()))
}

/// Parses a menu number in `0..=max`.
pub fn parse_choice(input: &str, max: u32) -> Result<u32, InputError> {
    let value = parse_number(input)?;
    if value > max {
        return Err(InputError::OutOfRange { value, max });
    }
    Ok(value)
}

pub fn parse_menu_choice(input: &str) -> Result<MenuChoice, InputError> {
    Ok(match parse_choice(input, 4)? {
        1 => MenuChoice::CreateOrder,
        2 => MenuChoice::ListOrders,
        3 => MenuChoice::ListShipments,
        4 => MenuChoice::UpdateShipment,
        _ => MenuChoice::Exit,
    })
}

pub fn parse_status_choice(input: &str) -> Result<StatusChoice, InputError> {
    match parse_number(input)? {
        1 => Ok(StatusChoice::Packed),
        2 => Ok(StatusChoice::Shipped),
        3 => Ok(StatusChoice::Delivered),
        value => Err(InputError::OutOfRange { value, max: 3 }),
    }
}

/// Parses a non-negative, finite amount.
pub fn parse_price(input: &str) -> Result<f64, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty("total price"));
    }
    match trimmed.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(InputError::InvalidPrice(trimmed.to_string())),
    }
}

pub fn parse_shipment_id(input: &str) -> Result<ShipmentId, InputError> {
    parse_number(input).map(ShipmentId)
}

/// Trims `input` and rejects it if nothing is left.
pub fn require_text(input: &str, field: &'static str) -> Result<String, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(InputError::Empty(field))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn format_order(order: &Order) -> String {
    format!(
        "#{:<4} {:<20} {:<24} {:>12.2}  {}  {}",
        order.id,
        order.customer_name,
        order.shipping_address,
        order.total_price,
        order.created_at.format("%Y-%m-%d %H:%M"),
        order.status
    )
}

pub fn format_shipment(shipment: &Shipment) -> String {
    let mut line = format!(
        "#{:<4} order #{:<4} {:<20} {:<24} {}",
        shipment.id, shipment.order_id, shipment.customer_name, shipment.shipping_address, shipment.status
    );
    if let Some(carrier) = &shipment.carrier {
        line.push_str(&format!("  carrier: {carrier}"));
    }
    if let Some(tracking) = &shipment.tracking_number {
        line.push_str(&format!("  tracking: {tracking}"));
    }
    line
}
