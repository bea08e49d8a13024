//! Order lifecycle state, grounded on `transfer::state::TransferState`:
//! a `#[repr(i16)]` enum with explicit discriminants, id round-trip, and a
//! terminality predicate, plus `can_transition_to` in the shape of the
//! `rcommerce` order-lifecycle reference (`other_examples`).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The closed set of order states (spec.md §3). `refund_pending` is named
/// in the source but documented as unused by the core and is not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i16)]
pub enum OrderStatus {
    AwaitingMerchant = 0,
    MerchantConfirmed = 10,
    DeliveryPublished = 20,
    Assigned = 30,
    Delivering = 40,
    Completed = 50,
    Canceled = -10,
}

impl OrderStatus {
    /// True once an order can no longer be mutated by any transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    /// True once an order carries a rider assignment.
    pub fn has_rider(self) -> bool {
        matches!(self, Self::Assigned | Self::Delivering | Self::Completed)
    }

    /// True once a chat group exists for the order.
    pub fn has_group(self) -> bool {
        self >= Self::MerchantConfirmed && self != Self::Canceled
    }

    pub fn id(self) -> i16 {
        self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::AwaitingMerchant),
            10 => Some(Self::MerchantConfirmed),
            20 => Some(Self::DeliveryPublished),
            30 => Some(Self::Assigned),
            40 => Some(Self::Delivering),
            50 => Some(Self::Completed),
            -10 => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingMerchant => "awaiting_merchant",
            Self::MerchantConfirmed => "merchant_confirmed",
            Self::DeliveryPublished => "delivery_published",
            Self::Assigned => "assigned",
            Self::Delivering => "delivering",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    /// Whether `event` legally advances `self` to `target`, per the
    /// transition table in spec.md §4.1. `cancel` is legal from any
    /// pre-`delivery_published`-or-earlier non-terminal state; `rider_complete`
    /// tolerates skipping the optional `delivering` sub-state.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, target) {
            (_, Canceled) => self == AwaitingMerchant || self == MerchantConfirmed || self == DeliveryPublished,
            (AwaitingMerchant, MerchantConfirmed) => true,
            (MerchantConfirmed, DeliveryPublished) => true,
            (DeliveryPublished, Assigned) => true,
            (Assigned, Delivering) => true,
            (Assigned, Completed) => true,
            (Delivering, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i16> for OrderStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_id(value).ok_or(())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "awaiting_merchant" => Ok(Self::AwaitingMerchant),
            "merchant_confirmed" => Ok(Self::MerchantConfirmed),
            "delivery_published" => Ok(Self::DeliveryPublished),
            "assigned" => Ok(Self::Assigned),
            "delivering" => Ok(Self::Delivering),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            other => Err(serde::de::Error::custom(format!("unknown order status: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip() {
        for s in [
            OrderStatus::AwaitingMerchant,
            OrderStatus::MerchantConfirmed,
            OrderStatus::DeliveryPublished,
            OrderStatus::Assigned,
            OrderStatus::Delivering,
            OrderStatus::Completed,
            OrderStatus::Canceled,
        ] {
            assert_eq!(OrderStatus::from_id(s.id()), Some(s));
        }
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(!OrderStatus::Assigned.is_terminal());
    }

    #[test]
    fn happy_path_transitions_legal() {
        use OrderStatus::*;
        assert!(AwaitingMerchant.can_transition_to(MerchantConfirmed));
        assert!(MerchantConfirmed.can_transition_to(DeliveryPublished));
        assert!(DeliveryPublished.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(Delivering));
        assert!(Delivering.can_transition_to(Completed));
        assert!(Assigned.can_transition_to(Completed));
    }

    #[test]
    fn cancel_only_before_delivery_published_exits() {
        use OrderStatus::*;
        assert!(AwaitingMerchant.can_transition_to(Canceled));
        assert!(MerchantConfirmed.can_transition_to(Canceled));
        assert!(DeliveryPublished.can_transition_to(Canceled));
        assert!(!Assigned.can_transition_to(Canceled));
        assert!(!Delivering.can_transition_to(Canceled));
        assert!(!Completed.can_transition_to(Canceled));
    }

    #[test]
    fn illegal_transitions_rejected() {
        use OrderStatus::*;
        assert!(!AwaitingMerchant.can_transition_to(Assigned));
        assert!(!Completed.can_transition_to(Delivering));
        assert!(!Canceled.can_transition_to(AwaitingMerchant));
    }

    #[test]
    fn rider_and_group_presence_invariants() {
        use OrderStatus::*;
        assert!(!AwaitingMerchant.has_rider());
        assert!(Assigned.has_rider());
        assert!(Delivering.has_rider());
        assert!(Completed.has_rider());

        assert!(!AwaitingMerchant.has_group());
        assert!(MerchantConfirmed.has_group());
        assert!(DeliveryPublished.has_group());
        assert!(!Canceled.has_group());
    }
}
