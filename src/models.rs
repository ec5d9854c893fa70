// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four fixed fee categories of the target schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeComponent {
    Admission,
    Security,
    Tuition,
    Other,
}

impl FeeComponent {
    pub const ALL: [FeeComponent; 4] = [
        FeeComponent::Admission,
        FeeComponent::Security,
        FeeComponent::Tuition,
        FeeComponent::Other,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            FeeComponent::Admission => "ADMISSION",
            FeeComponent::Security => "SECURITY",
            FeeComponent::Tuition => "TUITION",
            FeeComponent::Other => "OTHER",
        }
    }

    pub fn from_code(code: &str) -> Option<FeeComponent> {
        match code.trim().to_uppercase().as_str() {
            "ADMISSION" => Some(FeeComponent::Admission),
            "SECURITY" => Some(FeeComponent::Security),
            "TUITION" => Some(FeeComponent::Tuition),
            "OTHER" => Some(FeeComponent::Other),
            _ => None,
        }
    }
}

/// One target fee component row: internal code plus the identifier and label
/// the target database already carries for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRef {
    pub component: FeeComponent,
    pub target_id: String,
    pub label: String,
}

/// One historical payment instance, as exported from the legacy system.
/// Immutable once loaded; amounts are already coerced to non-negative values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyReceipt {
    pub id: String,
    pub student_id: String,
    pub enrol_code: String,
    pub fee_date: NaiveDate,
    pub receipt_no: Option<String>,
    pub reg_fee: Decimal,
    pub sec_fee: Decimal,
    pub tut_fee: Decimal,
    pub other_fee: Decimal,
    pub pre_bal: Decimal,
    pub rebate: Decimal,
    pub is_cancelled: bool,
    pub payment_method: String,
    pub reference_number: String,
    pub created_at: Option<String>,
}

impl LegacyReceipt {
    pub fn amount(&self, component: FeeComponent) -> Decimal {
        match component {
            FeeComponent::Admission => self.reg_fee,
            FeeComponent::Security => self.sec_fee,
            FeeComponent::Tuition => self.tut_fee,
            FeeComponent::Other => self.other_fee,
        }
    }

    pub fn total_amount(&self) -> Decimal {
        self.reg_fee + self.sec_fee + self.tut_fee + self.other_fee
    }
}

/// Per-component balance still owed immediately after one receipt was applied.
/// At most one per receipt; a missing snapshot reads as all-zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub receipt_id: String,
    pub reg_balance: Decimal,
    pub sec_balance: Decimal,
    pub tut_balance: Decimal,
    pub other_balance: Decimal,
}

impl BalanceSnapshot {
    pub fn balance(&self, component: FeeComponent) -> Decimal {
        match component {
            FeeComponent::Admission => self.reg_balance,
            FeeComponent::Security => self.sec_balance,
            FeeComponent::Tuition => self.tut_balance,
            FeeComponent::Other => self.other_balance,
        }
    }
}

/// Target enrollment row produced by the student transformer, consumed
/// read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub enrollment_code: String,
    pub enrollment_id: String,
    pub student_id: String,
    pub course_id: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    ChargeCreated,
    PaymentReceived,
    PaymentCancelled,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ChargeCreated => "CHARGE_CREATED",
            EventType::PaymentReceived => "PAYMENT_RECEIVED",
            EventType::PaymentCancelled => "PAYMENT_CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Active,
    Cancelled,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Active => "ACTIVE",
            ReceiptStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Standardized payment method enum of the target schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Bank,
    QrPhonepe,
    QrHdfc,
    Swipe,
    Cheque,
    Dd,
    Qr,
    Other,
}

impl PaymentMethod {
    /// Map a raw legacy payment-method string onto the target enum.
    /// Unknown or blank values fold into OTHER.
    pub fn from_legacy(raw: &str) -> PaymentMethod {
        match raw.trim().to_uppercase().as_str() {
            "CASH" => PaymentMethod::Cash,
            "BANK" => PaymentMethod::Bank,
            "QR PHONEPE" | "QR PHONEPAY" => PaymentMethod::QrPhonepe,
            "QR HDFC" => PaymentMethod::QrHdfc,
            "SWIPE" => PaymentMethod::Swipe,
            "CHEQUE" => PaymentMethod::Cheque,
            "DD" => PaymentMethod::Dd,
            "QR" => PaymentMethod::Qr,
            _ => PaymentMethod::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Bank => "BANK",
            PaymentMethod::QrPhonepe => "QR_PHONEPE",
            PaymentMethod::QrHdfc => "QR_HDFC",
            PaymentMethod::Swipe => "SWIPE",
            PaymentMethod::Cheque => "CHEQUE",
            PaymentMethod::Dd => "DD",
            PaymentMethod::Qr => "QR",
            PaymentMethod::Other => "OTHER",
        }
    }
}

/// One immutable posting in the reconstructed ledger. Append-only; the
/// running balance is the balance for this (enrollment, component) pair
/// after the event was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: Uuid,
    pub event_type: EventType,
    pub event_date: NaiveDate,
    pub enrollment_id: String,
    pub academic_year: String,
    pub fee_component_id: String,
    pub amount: Decimal,
    pub running_balance: Decimal,
    pub receipt_id: Option<Uuid>,
    pub description: String,
    pub created_at: String,
    pub legacy_receipt_id: String,
}

/// One migrated receipt row. Cancelled and zero-amount legacy receipts are
/// emitted too; the legacy component amounts ride along for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub receipt_number: String,
    pub receipt_date: NaiveDate,
    pub enrollment_id: String,
    pub academic_year: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_reference: String,
    pub legacy_reg_fee: Decimal,
    pub legacy_sec_fee: Decimal,
    pub legacy_tut_fee: Decimal,
    pub legacy_other_fee: Decimal,
    pub legacy_pre_bal: Decimal,
    pub legacy_rebate: Decimal,
    pub status: ReceiptStatus,
    pub comments: String,
    pub created_at: String,
    pub legacy_receipt_id: String,
}

/// Links one receipt, one ledger event and one component to the amount
/// allocated to that component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub ledger_event_id: Uuid,
    pub fee_component_id: String,
    pub allocated_amount: Decimal,
    pub enrollment_id: String,
    pub academic_year: String,
    pub receipt_date: NaiveDate,
    pub created_at: String,
    pub legacy_receipt_id: String,
}

/// Charge/paid/balance-after triple per component per receipt, for
/// reconciliation against the legacy snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub fee_component_id: String,
    pub charge_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub enrollment_id: String,
    pub academic_year: String,
    pub receipt_date: NaiveDate,
    pub created_at: String,
    pub legacy_receipt_id: String,
}
