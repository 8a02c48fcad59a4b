use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Reserved,
    Paid,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Reserved => "RESERVED",
            TicketStatus::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RESERVED" => Some(TicketStatus::Reserved),
            "PAID" => Some(TicketStatus::Paid),
            _ => None,
        }
    }
}

/// Immutable catalog entry describing a pass: its price and what it
/// entitles the holder to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    pub id: Uuid,
    pub name: String,
    /// Price in cents.
    pub price: i32,
    pub is_remote: bool,
    pub includes_hotel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub ticket_type_id: Uuid,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A ticket joined with its catalog entry, as the eligibility chain reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketWithType {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub ticket_type: TicketType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub card_issuer: String,
    pub card_last_digits: String,
    /// Charge in cents, copied from the ticket type's price at creation.
    pub value: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Card details as submitted by the payer. The number and cvv never reach
/// storage or logs in full.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    pub issuer: String,
    pub number: Masked<String>,
    pub name: String,
    pub expiration_date: String,
    pub cvv: Masked<String>,
}

impl CardData {
    /// Last four characters of the card number, for the persisted payment
    /// row. Counts characters, not bytes; the number arrives unvalidated.
    pub fn last_digits(&self) -> String {
        let tail: Vec<char> = self.number.0.chars().rev().take(4).collect();
        tail.into_iter().rev().collect()
    }
}

/// The persistable part of a recorded payment: everything except the
/// generated id and timestamps.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub ticket_id: Uuid,
    pub card_issuer: String,
    pub card_last_digits: String,
    pub value: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str) -> CardData {
        CardData {
            issuer: "VISA".to_string(),
            number: Masked(number.to_string()),
            name: "Jo Attendee".to_string(),
            expiration_date: "12/29".to_string(),
            cvv: Masked("123".to_string()),
        }
    }

    #[test]
    fn last_digits_takes_the_tail() {
        assert_eq!(card("4111111111111234").last_digits(), "1234");
    }

    #[test]
    fn last_digits_of_short_number_is_the_whole_number() {
        assert_eq!(card("42").last_digits(), "42");
        assert_eq!(card("").last_digits(), "");
    }

    #[test]
    fn last_digits_survives_multibyte_input() {
        // The number is attacker-controlled; byte slicing would panic here.
        assert_eq!(card("€€€€€€").last_digits(), "€€€€");
        assert_eq!(card("411€").last_digits(), "411€");
    }
}
