//! Lifecycle enums persisted as text columns.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

macro_rules! text_enum {
    ($name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::BadRequest(format!(
                        concat!("Invalid ", $label, " {}"),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

text_enum!(OrderStatus, "order status" {
    Pending => "pending",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Delivered and cancelled orders are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

text_enum!(PaymentStatus, "payment status" {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Card,
    Upi,
    Netbanking,
    Wallet,
}

text_enum!(PaymentMethod, "payment method" {
    Cod => "cod",
    Card => "card",
    Upi => "upi",
    Netbanking => "netbanking",
    Wallet => "wallet",
});

impl PaymentMethod {
    /// Everything except cash on delivery is settled at checkout.
    pub fn settles_at_checkout(&self) -> bool {
        !matches!(self, PaymentMethod::Cod)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CheckupStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

text_enum!(CheckupStatus, "checkup status" {
    Pending => "pending",
    InProgress => "in-progress",
    Completed => "completed",
});

impl CheckupStatus {
    fn rank(&self) -> u8 {
        match self {
            CheckupStatus::Pending => 0,
            CheckupStatus::InProgress => 1,
            CheckupStatus::Completed => 2,
        }
    }

    /// Status only moves forward one step at a time.
    pub fn can_advance_to(&self, next: CheckupStatus) -> bool {
        next.rank() == self.rank() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DoctorStatus {
    Pending,
    Approved,
    Rejected,
}

text_enum!(DoctorStatus, "doctor status" {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trips_through_from_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        for status in CheckupStatus::ALL {
            assert_eq!(status.as_str().parse::<CheckupStatus>().unwrap(), *status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert!("in_progress".parse::<CheckupStatus>().is_err());
    }

    #[test]
    fn serde_uses_the_column_text() {
        let json = serde_json::to_string(&CheckupStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let method: PaymentMethod = serde_json::from_str("\"upi\"").unwrap();
        assert_eq!(method, PaymentMethod::Upi);
    }

    #[test]
    fn checkup_status_is_forward_only() {
        use CheckupStatus::*;
        assert!(Pending.can_advance_to(InProgress));
        assert!(InProgress.can_advance_to(Completed));
        assert!(!Pending.can_advance_to(Completed));
        assert!(!Completed.can_advance_to(InProgress));
        assert!(!InProgress.can_advance_to(InProgress));
    }

    #[test]
    fn only_cod_defers_payment() {
        assert!(!PaymentMethod::Cod.settles_at_checkout());
        assert!(PaymentMethod::Card.settles_at_checkout());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }
}
