use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod material {
    use super::*;

    /// Request body for creating a material (administrative operation).
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MaterialNew {
        pub name: String,
        /// `rubber`, `chemical`, or any other category string.
        pub category: String,
        /// Opening stock in kilograms; posts an initial ledger entry.
        pub opening_balance: Option<f64>,
    }

    /// Listing row: a material without its history.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MaterialView {
        pub id: Uuid,
        pub name: String,
        pub category: String,
        /// Current balance in kilograms. Signed; stock may go negative.
        pub balance: f64,
    }

    /// One line of a material's transaction history.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerEntryView {
        /// RFC3339 timestamp of the posting.
        pub date: DateTime<Utc>,
        pub particulars: String,
        pub inward: f64,
        pub outward: f64,
        /// Running balance after this entry.
        pub balance: f64,
        pub remarks: Option<String>,
    }

    /// A material joined with its full transaction history.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MaterialDetail {
        pub id: Uuid,
        pub name: String,
        pub category: String,
        pub balance: f64,
        pub logs: Vec<LedgerEntryView>,
    }

    /// Query parameters for the material listing.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MaterialListQuery {
        pub category: Option<String>,
    }

    /// Request body for recording a stock transaction.
    ///
    /// Quantities are kilograms; at least one of `inward`/`outward` must be
    /// nonzero.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionNew {
        pub particulars: String,
        #[serde(default)]
        pub inward: f64,
        #[serde(default)]
        pub outward: f64,
        pub remarks: Option<String>,
    }

    /// Response for a recorded transaction: the appended entry plus the
    /// material's updated balance.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionLogged {
        pub entry: LedgerEntryView,
        pub balance: f64,
    }
}

pub mod formula {
    use super::*;

    /// One ingredient line as carried on the wire.
    ///
    /// `consumption` is server-computed (`ratio × lotMultiplier`);
    /// client-supplied values are ignored on create/update and echoed back
    /// from the stored cache in responses.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct IngredientBody {
        /// `rubber` or `chemical`.
        #[serde(rename = "type")]
        pub kind: String,
        pub name: String,
        /// Weight share in kilograms (same unit as `totalWeight`).
        pub ratio: f64,
        pub phr: Option<f64>,
        pub consumption: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FormulaNew {
        pub name: String,
        pub lot_multiplier: i64,
        pub ingredients: Vec<IngredientBody>,
        pub total_weight: f64,
    }

    /// Update replaces name and ingredients; `totalWeight` and
    /// `lotMultiplier` stay frozen at their creation values.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FormulaUpdate {
        pub name: String,
        pub ingredients: Vec<IngredientBody>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FormulaView {
        pub id: Uuid,
        pub name: String,
        pub lot_multiplier: i64,
        pub ingredients: Vec<IngredientBody>,
        pub total_weight: f64,
    }
}

pub mod order {
    use super::*;

    /// Request body for submitting a production order.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OrderNew {
        /// Production date as entered (free-form).
        pub date: String,
        pub shift: String,
        pub order_no: String,
        pub machine_no: String,
        pub operator: String,
        pub batch_no: String,
        /// Kilograms.
        pub batch_weight: f64,
        pub number_of_batches: i64,
        pub remarks: Option<String>,
        pub selected_formula_id: Uuid,
    }

    /// One line of the draw snapshot persisted with an order.
    ///
    /// `materialId` is absent when the ingredient matched no material and
    /// the deduction was skipped.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DrawView {
        pub material_id: Option<Uuid>,
        pub ingredient: String,
        /// Kilograms drawn for this order.
        pub quantity: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OrderView {
        pub id: Uuid,
        pub date: String,
        pub shift: String,
        pub order_no: String,
        pub machine_no: String,
        pub operator: String,
        pub batch_no: String,
        pub batch_weight: f64,
        pub number_of_batches: i64,
        pub remarks: Option<String>,
        pub selected_formula_id: Uuid,
        pub draws: Vec<DrawView>,
        /// Present when the listing was requested with `withFormula=true`
        /// and the formula still exists.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub formula: Option<super::formula::FormulaView>,
    }

    /// Query parameters for the order listing.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OrderListQuery {
        pub with_formula: Option<bool>,
    }
}
