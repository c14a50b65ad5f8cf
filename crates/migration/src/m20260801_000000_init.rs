//! Initial schema migration - creates all tables from scratch.
//!
//! - `materials`: raw-material stock positions with a cached balance
//! - `ledger_entries`: append-only transaction log per material
//! - `formulas`: compounding recipes
//! - `formula_ingredients`: ordered ingredient lines per formula
//! - `orders`: submitted production orders
//! - `order_draws`: per-ingredient draw snapshot persisted with each order

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Materials {
    Table,
    Id,
    Name,
    Category,
    BalanceG,
    CreatedAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    MaterialId,
    Seq,
    RecordedAt,
    Particulars,
    InwardG,
    OutwardG,
    BalanceG,
    Remarks,
}

#[derive(Iden)]
enum Formulas {
    Table,
    Id,
    Name,
    LotMultiplier,
    TotalWeightG,
}

#[derive(Iden)]
enum FormulaIngredients {
    Table,
    Id,
    FormulaId,
    Position,
    Kind,
    Name,
    RatioG,
    Phr,
    ConsumptionG,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    Date,
    Shift,
    OrderNo,
    MachineNo,
    Operator,
    BatchNo,
    BatchWeightG,
    NumberOfBatches,
    Remarks,
    FormulaId,
    CreatedAt,
}

#[derive(Iden)]
enum OrderDraws {
    Table,
    Id,
    OrderId,
    Position,
    MaterialId,
    Ingredient,
    QuantityG,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Materials
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Materials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Materials::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Materials::Name).string().not_null())
                    .col(ColumnDef::new(Materials::Category).string().not_null())
                    .col(
                        ColumnDef::new(Materials::BalanceG)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Materials::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-materials-name-unique")
                    .table(Materials::Table)
                    .col(Materials::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Ledger entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::MaterialId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Seq).integer().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Particulars)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::InwardG)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::OutwardG)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::BalanceG)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Remarks).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-material_id")
                            .from(LedgerEntries::Table, LedgerEntries::MaterialId)
                            .to(Materials::Table, Materials::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-material_id-seq-unique")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::MaterialId)
                    .col(LedgerEntries::Seq)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Formulas
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Formulas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Formulas::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Formulas::Name).string().not_null())
                    .col(
                        ColumnDef::new(Formulas::LotMultiplier)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Formulas::TotalWeightG)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-formulas-name-unique")
                    .table(Formulas::Table)
                    .col(Formulas::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Formula ingredients
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FormulaIngredients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormulaIngredients::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FormulaIngredients::FormulaId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FormulaIngredients::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FormulaIngredients::Kind).string().not_null())
                    .col(ColumnDef::new(FormulaIngredients::Name).string().not_null())
                    .col(
                        ColumnDef::new(FormulaIngredients::RatioG)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FormulaIngredients::Phr).double())
                    .col(ColumnDef::new(FormulaIngredients::ConsumptionG).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-formula_ingredients-formula_id")
                            .from(FormulaIngredients::Table, FormulaIngredients::FormulaId)
                            .to(Formulas::Table, Formulas::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-formula_ingredients-formula_id-position-unique")
                    .table(FormulaIngredients::Table)
                    .col(FormulaIngredients::FormulaId)
                    .col(FormulaIngredients::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Orders
        // ───────────────────────────────────────────────────────────────────
        // `formula_id` is a weak reference by design: formulas may be edited
        // or deleted after orders were cut, and the order keeps its own draw
        // snapshot. No foreign key.
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Orders::Date).string().not_null())
                    .col(ColumnDef::new(Orders::Shift).string().not_null())
                    .col(ColumnDef::new(Orders::OrderNo).string().not_null())
                    .col(ColumnDef::new(Orders::MachineNo).string().not_null())
                    .col(ColumnDef::new(Orders::Operator).string().not_null())
                    .col(ColumnDef::new(Orders::BatchNo).string().not_null())
                    .col(
                        ColumnDef::new(Orders::BatchWeightG)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::NumberOfBatches)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::Remarks).string())
                    .col(ColumnDef::new(Orders::FormulaId).string().not_null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Order draws
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(OrderDraws::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderDraws::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderDraws::OrderId).string().not_null())
                    .col(ColumnDef::new(OrderDraws::Position).integer().not_null())
                    .col(ColumnDef::new(OrderDraws::MaterialId).string())
                    .col(ColumnDef::new(OrderDraws::Ingredient).string().not_null())
                    .col(
                        ColumnDef::new(OrderDraws::QuantityG)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-order_draws-order_id")
                            .from(OrderDraws::Table, OrderDraws::OrderId)
                            .to(Orders::Table, Orders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-order_draws-order_id-position-unique")
                    .table(OrderDraws::Table)
                    .col(OrderDraws::OrderId)
                    .col(OrderDraws::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderDraws::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FormulaIngredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Formulas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Materials::Table).to_owned())
            .await?;
        Ok(())
    }
}
