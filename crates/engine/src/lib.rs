use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
pub use error::EngineError;
pub use formula::{Formula, Ingredient, IngredientKind};
pub use ledger_entry::LedgerEntry;
pub use material::{Material, MaterialCategory, MaterialSummary};
pub use order::{Order, OrderDraft};
pub use order_draw::OrderDraw;
pub use planner::{PlannedDraw, plan};
pub use quantity::Grams;
use sea_orm::{ActiveValue, DbErr, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

mod error;
mod formula;
mod formula_ingredient;
mod ledger_entry;
mod material;
mod order;
mod order_draw;
mod planner;
mod quantity;

type ResultEngine<T> = Result<T, EngineError>;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Normalized key for the loose ingredient→material name matching:
/// formulas reference materials by name, tolerant of casing, surrounding
/// whitespace and Unicode representation.
fn normalize_name(name: &str) -> String {
    name.trim().nfkc().collect::<String>().to_lowercase()
}

#[derive(Debug, Default)]
struct MaterialIndex {
    by_id: HashMap<Uuid, Arc<Mutex<Material>>>,
    /// Normalized name → id. Material names are unique and immutable.
    by_name: HashMap<String, Uuid>,
}

/// The inventory engine: material ledger, formula catalog, consumption
/// planner and order reconciler behind one shared-state handle.
///
/// Every mutation is persisted inside a database transaction *before* the
/// in-memory state changes, so the shared state never reflects writes the
/// database rejected. Each material sits behind its own async mutex; an
/// order locks all the materials it touches, in sorted id order, before
/// staging any deduction.
#[derive(Debug)]
pub struct Engine {
    materials: RwLock<MaterialIndex>,
    formulas: RwLock<HashMap<Uuid, Formula>>,
    database: DatabaseConnection,
    lock_timeout: Duration,
}

fn deduction_failure(material: &str, err: DbErr) -> EngineError {
    EngineError::LedgerFailure(format!(
        "could not apply deduction for \"{material}\": {err}"
    ))
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    async fn material_handle(&self, material_id: Uuid) -> ResultEngine<Arc<Mutex<Material>>> {
        let index = self.materials.read().await;
        index
            .by_id
            .get(&material_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(material_id.to_string()))
    }

    /// Bounded lock acquisition: a stuck writer surfaces as a ledger
    /// failure instead of a hang.
    async fn lock_material(
        &self,
        handle: Arc<Mutex<Material>>,
    ) -> ResultEngine<OwnedMutexGuard<Material>> {
        tokio::time::timeout(self.lock_timeout, handle.lock_owned())
            .await
            .map_err(|_| {
                EngineError::LedgerFailure("timed out waiting for material lock".to_string())
            })
    }

    /// Registers a new material, optionally with an opening stock entry.
    ///
    /// Materials are created administratively and never deleted; after
    /// creation stock moves only through [`Engine::record`].
    pub async fn new_material(
        &self,
        name: &str,
        category: MaterialCategory,
        opening_stock: Option<Grams>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Material> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EngineError::Validation(
                "material name is required".to_string(),
            ));
        }
        let key = normalize_name(trimmed);

        let mut index = self.materials.write().await;
        if index.by_name.contains_key(&key) {
            return Err(EngineError::DuplicateName(trimmed.to_string()));
        }

        let mut material = Material::new(trimmed.to_string(), category, created_at);
        if let Some(qty) = opening_stock
            && !qty.is_zero()
        {
            let entry = material.stage_entry(
                created_at,
                "Opening stock".to_string(),
                qty,
                Grams::ZERO,
                None,
            )?;
            material.apply_entry(entry);
        }

        let db_tx = self.database.begin().await?;
        material::ActiveModel::from(&material).insert(&db_tx).await?;
        for entry in &material.entries {
            ledger_entry::ActiveModel::from(entry).insert(&db_tx).await?;
        }
        db_tx.commit().await?;

        let snapshot = material.clone();
        index.by_name.insert(key, material.id);
        index.by_id.insert(material.id, Arc::new(Mutex::new(material)));
        Ok(snapshot)
    }

    /// Records one stock transaction and returns the appended entry.
    ///
    /// This is the *only* balance mutator: the new balance is chained off
    /// the log tail (`last + inward − outward`) and the cached balance
    /// follows. Concurrent postings on one material serialize on its lock;
    /// the second caller chains off the entry the first one appended.
    pub async fn record(
        &self,
        material_id: Uuid,
        inward_g: Grams,
        outward_g: Grams,
        particulars: &str,
        remarks: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> ResultEngine<LedgerEntry> {
        let handle = self.material_handle(material_id).await?;
        let mut guard = self.lock_material(handle).await?;

        let entry = guard.stage_entry(
            recorded_at,
            particulars.to_string(),
            inward_g,
            outward_g,
            remarks,
        )?;

        let db_tx = self.database.begin().await?;
        ledger_entry::ActiveModel::from(&entry).insert(&db_tx).await?;
        let update = material::ActiveModel {
            id: ActiveValue::Set(guard.id.to_string()),
            balance_g: ActiveValue::Set(entry.balance_g.grams()),
            ..Default::default()
        };
        update.update(&db_tx).await?;
        db_tx.commit().await?;

        guard.apply_entry(entry.clone());
        Ok(entry)
    }

    /// Current balance of a material.
    pub async fn balance(&self, material_id: Uuid) -> ResultEngine<Grams> {
        let handle = self.material_handle(material_id).await?;
        let guard = self.lock_material(handle).await?;
        Ok(guard.balance_g)
    }

    /// Returns a material together with its full transaction history.
    pub async fn material(&self, material_id: Uuid) -> ResultEngine<Material> {
        let handle = self.material_handle(material_id).await?;
        let guard = self.lock_material(handle).await?;
        Ok(guard.clone())
    }

    /// Snapshot of the material catalog, optionally filtered by category.
    ///
    /// Ordering is unspecified; callers must not rely on it.
    pub async fn materials(&self, category: Option<&str>) -> ResultEngine<Vec<MaterialSummary>> {
        let handles: Vec<Arc<Mutex<Material>>> = {
            let index = self.materials.read().await;
            index.by_id.values().cloned().collect()
        };

        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            let guard = self.lock_material(handle).await?;
            if category.is_none_or(|filter| guard.category.matches(filter)) {
                out.push(guard.summary());
            }
        }
        Ok(out)
    }

    /// Creates a formula. The consumption cache is computed server-side;
    /// client-supplied values are never trusted.
    pub async fn new_formula(
        &self,
        name: &str,
        lot_multiplier: i64,
        ingredients: Vec<Ingredient>,
        total_weight_g: Grams,
    ) -> ResultEngine<Formula> {
        let mut formulas = self.formulas.write().await;
        let key = normalize_name(name);
        if formulas
            .values()
            .any(|formula| normalize_name(&formula.name) == key)
        {
            return Err(EngineError::DuplicateName(name.trim().to_string()));
        }

        let formula = Formula::new(
            name.trim().to_string(),
            lot_multiplier,
            ingredients,
            total_weight_g,
        )?;

        let db_tx = self.database.begin().await?;
        formula::ActiveModel::from(&formula).insert(&db_tx).await?;
        for model in formula.ingredient_models() {
            model.insert(&db_tx).await?;
        }
        db_tx.commit().await?;

        let snapshot = formula.clone();
        formulas.insert(formula.id, formula);
        Ok(snapshot)
    }

    /// Replaces a formula's name and ingredient list.
    ///
    /// The declared total weight is not re-validated against the new
    /// ratios (a deliberate quirk; see `Formula::replace_ingredients`).
    pub async fn update_formula(
        &self,
        formula_id: Uuid,
        name: &str,
        ingredients: Vec<Ingredient>,
    ) -> ResultEngine<Formula> {
        let mut formulas = self.formulas.write().await;
        let current = formulas
            .get(&formula_id)
            .ok_or_else(|| EngineError::NotFound(formula_id.to_string()))?;

        let mut updated = current.clone();
        updated.replace_ingredients(name.trim().to_string(), ingredients)?;

        let db_tx = self.database.begin().await?;
        let model = formula::ActiveModel {
            id: ActiveValue::Set(updated.id.to_string()),
            name: ActiveValue::Set(updated.name.clone()),
            ..Default::default()
        };
        model.update(&db_tx).await?;
        formula_ingredient::Entity::delete_many()
            .filter(formula_ingredient::Column::FormulaId.eq(updated.id.to_string()))
            .exec(&db_tx)
            .await?;
        for model in updated.ingredient_models() {
            model.insert(&db_tx).await?;
        }
        db_tx.commit().await?;

        let snapshot = updated.clone();
        formulas.insert(formula_id, updated);
        Ok(snapshot)
    }

    /// Deletes a formula and returns it.
    ///
    /// Orders keep their draw snapshots, so deleting a formula never
    /// rewrites order history.
    pub async fn delete_formula(&self, formula_id: Uuid) -> ResultEngine<Formula> {
        let mut formulas = self.formulas.write().await;
        if !formulas.contains_key(&formula_id) {
            return Err(EngineError::NotFound(formula_id.to_string()));
        }

        let db_tx = self.database.begin().await?;
        formula_ingredient::Entity::delete_many()
            .filter(formula_ingredient::Column::FormulaId.eq(formula_id.to_string()))
            .exec(&db_tx)
            .await?;
        formula::Entity::delete_by_id(formula_id.to_string())
            .exec(&db_tx)
            .await?;
        db_tx.commit().await?;

        match formulas.remove(&formula_id) {
            Some(formula) => Ok(formula),
            None => Err(EngineError::NotFound(formula_id.to_string())),
        }
    }

    /// Return a [`Formula`].
    pub async fn formula(&self, formula_id: Uuid) -> ResultEngine<Formula> {
        let formulas = self.formulas.read().await;
        formulas
            .get(&formula_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(formula_id.to_string()))
    }

    pub async fn formulas(&self) -> Vec<Formula> {
        let formulas = self.formulas.read().await;
        formulas.values().cloned().collect()
    }

    /// Submits a production order: plans the per-ingredient draws and
    /// applies them to the ledger as one unit.
    ///
    /// Either every deduction succeeds and the order is persisted, or
    /// nothing is applied. All touched materials are locked up front (in
    /// sorted id order, each acquisition bounded by the lock timeout), the
    /// deductions are staged against clones, and order + draw snapshot +
    /// ledger entries + balances go into a single database transaction.
    /// Any database error inside that scope rolls everything back and
    /// surfaces as [`EngineError::LedgerFailure`] naming the material.
    ///
    /// Ingredients that match no material are skipped with a warning and
    /// recorded in the draw snapshot with no material reference.
    pub async fn submit_order(
        &self,
        draft: OrderDraft,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Order> {
        draft.validate()?;

        let formula = {
            let formulas = self.formulas.read().await;
            formulas.get(&draft.formula_id).cloned()
        }
        .ok_or_else(|| EngineError::FormulaNotFound(draft.formula_id.to_string()))?;

        let draws = planner::plan(&formula, draft.batch_weight_g, draft.number_of_batches)?;

        // Resolve ingredient names against the catalog (weak, by-name link).
        let resolved: Vec<(PlannedDraw, Option<(Uuid, Arc<Mutex<Material>>)>)> = {
            let index = self.materials.read().await;
            draws
                .into_iter()
                .map(|draw| {
                    let target = index
                        .by_name
                        .get(&normalize_name(&draw.ingredient))
                        .and_then(|id| {
                            index
                                .by_id
                                .get(id)
                                .map(|handle| (*id, Arc::clone(handle)))
                        });
                    (draw, target)
                })
                .collect()
        };

        // Lock every touched material before staging anything. The sorted
        // acquisition order is the deadlock guard for concurrent orders.
        let mut targets: Vec<(Uuid, Arc<Mutex<Material>>)> = resolved
            .iter()
            .filter_map(|(_, target)| target.clone())
            .collect();
        targets.sort_by_key(|(id, _)| *id);
        targets.dedup_by_key(|(id, _)| *id);

        let mut guards: HashMap<Uuid, OwnedMutexGuard<Material>> = HashMap::new();
        for (id, handle) in targets {
            let guard = tokio::time::timeout(self.lock_timeout, handle.lock_owned())
                .await
                .map_err(|_| {
                    EngineError::LedgerFailure(format!(
                        "timed out waiting for material lock while reconciling order {}",
                        draft.order_no
                    ))
                })?;
            guards.insert(id, guard);
        }

        // Stage every deduction against preview clones; shared state stays
        // untouched until the database transaction commits.
        let mut order = Order::from_draft(draft, created_at);
        let particulars = format!("Order {}", order.order_no);
        let mut previews: HashMap<Uuid, Material> = guards
            .iter()
            .map(|(id, guard)| (*id, Material::clone(guard)))
            .collect();
        let mut staged: Vec<(Uuid, LedgerEntry)> = Vec::new();

        for (draw, target) in resolved {
            match target {
                None => {
                    tracing::warn!(
                        ingredient = %draw.ingredient,
                        order_no = %order.order_no,
                        "ingredient has no matching material; deduction skipped"
                    );
                    order
                        .draws
                        .push(OrderDraw::new(order.id, None, draw.ingredient, draw.quantity_g));
                }
                Some((material_id, _)) => {
                    let preview = previews.get_mut(&material_id).ok_or_else(|| {
                        EngineError::LedgerFailure(
                            "material lock missing during staging".to_string(),
                        )
                    })?;
                    let entry = preview.stage_entry(
                        created_at,
                        particulars.clone(),
                        Grams::ZERO,
                        draw.quantity_g,
                        None,
                    )?;
                    preview.apply_entry(entry.clone());
                    staged.push((material_id, entry));
                    order.draws.push(OrderDraw::new(
                        order.id,
                        Some(material_id),
                        draw.ingredient,
                        draw.quantity_g,
                    ));
                }
            }
        }

        let db_tx = self.database.begin().await.map_err(|err| {
            EngineError::LedgerFailure(format!(
                "could not open ledger transaction for order {}: {err}",
                order.order_no
            ))
        })?;
        order::ActiveModel::from(&order)
            .insert(&db_tx)
            .await
            .map_err(|err| {
                EngineError::LedgerFailure(format!(
                    "could not persist order {}: {err}",
                    order.order_no
                ))
            })?;
        for (position, draw) in order.draws.iter().enumerate() {
            order_draw::active_model(position as i32, draw)
                .insert(&db_tx)
                .await
                .map_err(|err| deduction_failure(&draw.ingredient, err))?;
        }
        for (material_id, entry) in &staged {
            let material_name = previews
                .get(material_id)
                .map(|preview| preview.name.clone())
                .unwrap_or_else(|| material_id.to_string());
            ledger_entry::ActiveModel::from(entry)
                .insert(&db_tx)
                .await
                .map_err(|err| deduction_failure(&material_name, err))?;
        }
        for (material_id, preview) in &previews {
            let update = material::ActiveModel {
                id: ActiveValue::Set(material_id.to_string()),
                balance_g: ActiveValue::Set(preview.balance_g.grams()),
                ..Default::default()
            };
            update
                .update(&db_tx)
                .await
                .map_err(|err| deduction_failure(&preview.name, err))?;
        }
        db_tx.commit().await.map_err(|err| {
            EngineError::LedgerFailure(format!(
                "could not commit order {}: {err}",
                order.order_no
            ))
        })?;

        // Apply the staged entries to shared state only after the commit.
        for (material_id, entry) in staged {
            if let Some(guard) = guards.get_mut(&material_id) {
                guard.apply_entry(entry);
            }
        }

        Ok(order)
    }

    /// Lists submitted orders (oldest first) with their draw snapshots.
    pub async fn orders(&self) -> ResultEngine<Vec<Order>> {
        let order_models = order::Entity::find()
            .order_by_asc(order::Column::CreatedAt)
            .all(&self.database)
            .await?;
        let draw_models = order_draw::Entity::find()
            .order_by_asc(order_draw::Column::Position)
            .all(&self.database)
            .await?;

        let mut draws_by_order: HashMap<String, Vec<OrderDraw>> = HashMap::new();
        for model in draw_models {
            let order_id = model.order_id.clone();
            draws_by_order
                .entry(order_id)
                .or_default()
                .push(OrderDraw::try_from(model)?);
        }

        let mut orders = Vec::with_capacity(order_models.len());
        for model in order_models {
            let key = model.id.clone();
            let mut order = Order::try_from(model)?;
            order.draws = draws_by_order.remove(&key).unwrap_or_default();
            orders.push(order);
        }
        Ok(orders)
    }

    /// Return one submitted [`Order`] with its draws.
    pub async fn order(&self, order_id: Uuid) -> ResultEngine<Order> {
        let model = order::Entity::find_by_id(order_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound(order_id.to_string()))?;
        let mut order = Order::try_from(model)?;

        let draw_models = order_draw::Entity::find()
            .filter(order_draw::Column::OrderId.eq(order_id.to_string()))
            .order_by_asc(order_draw::Column::Position)
            .all(&self.database)
            .await?;
        order.draws = draw_models
            .into_iter()
            .map(OrderDraw::try_from)
            .collect::<ResultEngine<_>>()?;
        Ok(order)
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    lock_timeout: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Bound on waiting for a per-material lock. Expiry surfaces as
    /// [`EngineError::LedgerFailure`] instead of blocking indefinitely.
    pub fn lock_timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.lock_timeout = timeout;
        self
    }

    /// Construct `Engine`, loading materials and formulas from the database.
    ///
    /// Balances are re-derived from each ledger tail; a cached balance that
    /// disagrees with its log is reported and the log wins.
    pub async fn build(self) -> ResultEngine<Engine> {
        let mut index = MaterialIndex::default();

        let material_models = material::Entity::find().all(&self.database).await?;
        for model in material_models {
            let entry_models = ledger_entry::Entity::find()
                .filter(ledger_entry::Column::MaterialId.eq(model.id.clone()))
                .order_by_asc(ledger_entry::Column::Seq)
                .all(&self.database)
                .await?;
            let mut entries = Vec::with_capacity(entry_models.len());
            for entry_model in entry_models {
                entries.push(LedgerEntry::try_from(entry_model)?);
            }

            let id = Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("material".to_string()))?;
            let tail = entries
                .last()
                .map(|entry| entry.balance_g)
                .unwrap_or(Grams::ZERO);
            if tail.grams() != model.balance_g {
                tracing::warn!(
                    material = %model.name,
                    cached = model.balance_g,
                    derived = tail.grams(),
                    "cached balance disagrees with ledger tail; trusting the ledger"
                );
            }

            let material = Material {
                id,
                name: model.name,
                category: MaterialCategory::from(model.category.as_str()),
                balance_g: tail,
                created_at: model.created_at,
                entries,
            };
            index.by_name.insert(normalize_name(&material.name), id);
            index.by_id.insert(id, Arc::new(Mutex::new(material)));
        }

        let mut formulas = HashMap::new();
        let formula_models = formula::Entity::find().all(&self.database).await?;
        for model in formula_models {
            let ingredient_models = formula_ingredient::Entity::find()
                .filter(formula_ingredient::Column::FormulaId.eq(model.id.clone()))
                .order_by_asc(formula_ingredient::Column::Position)
                .all(&self.database)
                .await?;
            let mut ingredients = Vec::with_capacity(ingredient_models.len());
            for ingredient_model in ingredient_models {
                ingredients.push(Ingredient::try_from(ingredient_model)?);
            }

            let id = Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("formula".to_string()))?;
            formulas.insert(
                id,
                Formula {
                    id,
                    name: model.name,
                    lot_multiplier: model.lot_multiplier,
                    ingredients,
                    total_weight_g: Grams::new(model.total_weight_g),
                },
            );
        }

        Ok(Engine {
            materials: RwLock::new(index),
            formulas: RwLock::new(formulas),
            database: self.database,
            lock_timeout: self.lock_timeout,
        })
    }
}
