//! Owned, per-scope field orderings

use std::collections::BTreeMap;

use tracing::warn;

use crate::types::{CustomField, FieldId, ParentType};

use super::consistency::{ConsistencyReport, check_orders};

/// The fields of one scope, kept sorted by `display_order`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OrderedCollection {
    parent_type: ParentType,
    fields: Vec<CustomField>,
}

impl OrderedCollection {
    /// Builds the collection from a snapshot. Fields belonging to another scope are dropped.
    pub fn new(parent_type: ParentType, fields: impl IntoIterator<Item = CustomField>) -> Self {
        let mut fields: Vec<CustomField> = fields
            .into_iter()
            .filter(|field| {
                if field.parent_type == parent_type {
                    return true;
                }
                warn!(
                    field_id = %field.id,
                    expected = %parent_type,
                    actual = %field.parent_type,
                    "dropping field from foreign scope"
                );
                false
            })
            .collect();
        fields.sort_by_key(|field| (field.display_order, field.id));
        Self {
            parent_type,
            fields,
        }
    }

    pub fn parent_type(&self) -> ParentType {
        self.parent_type
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, id: FieldId) -> Option<&CustomField> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn order_of(&self, id: FieldId) -> Option<i64> {
        self.get(id).map(|field| field.display_order)
    }

    /// Every field, deleted ones included, in display order.
    pub fn ordered(&self) -> &[CustomField] {
        &self.fields
    }

    /// Fields shown by default views.
    pub fn visible(&self) -> impl Iterator<Item = &CustomField> {
        self.fields.iter().filter(|field| !field.deleted)
    }

    pub fn ids(&self) -> Vec<FieldId> {
        self.fields.iter().map(|field| field.id).collect()
    }

    pub fn check_consistency(&self) -> ConsistencyReport {
        check_orders(
            self.parent_type,
            self.fields.iter().map(|field| field.display_order),
        )
    }

    /// Order a newly created field receives when none is requested.
    pub fn next_display_order(&self) -> i64 {
        self.fields
            .iter()
            .map(|field| field.display_order)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Adds a field created upstream. Returns false when it belongs to another scope or
    /// is already present.
    pub fn insert(&mut self, field: CustomField) -> bool {
        if field.parent_type != self.parent_type || self.get(field.id).is_some() {
            return false;
        }
        self.fields.push(field);
        self.sort();
        true
    }

    /// Mirrors a confirmed absolute position change: fields between the old and new
    /// positions shift by one to close the gap, then the field takes `new_order`.
    pub(crate) fn apply_move(&mut self, id: FieldId, new_order: i64) -> bool {
        let Some(old_order) = self.order_of(id) else {
            return false;
        };

        for field in &mut self.fields {
            let order = field.display_order;
            if field.id == id {
                field.display_order = new_order;
            } else if new_order > old_order && order > old_order && order <= new_order {
                field.display_order -= 1;
            } else if new_order < old_order && order >= new_order && order < old_order {
                field.display_order += 1;
            }
        }

        self.sort();
        true
    }

    fn sort(&mut self) {
        self.fields
            .sort_by_key(|field| (field.display_order, field.id));
    }
}

/// A loaded field list split by scope.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    scopes: BTreeMap<ParentType, OrderedCollection>,
}

impl FieldCatalog {
    pub fn from_fields(fields: impl IntoIterator<Item = CustomField>) -> Self {
        let mut grouped: BTreeMap<ParentType, Vec<CustomField>> = BTreeMap::new();
        for field in fields {
            grouped.entry(field.parent_type).or_default().push(field);
        }

        let scopes = grouped
            .into_iter()
            .map(|(parent_type, fields)| (parent_type, OrderedCollection::new(parent_type, fields)))
            .collect();
        Self { scopes }
    }

    pub fn collection(&self, parent_type: ParentType) -> Option<&OrderedCollection> {
        self.scopes.get(&parent_type)
    }

    /// Removes one scope from the catalog. An unknown scope yields an empty collection.
    pub fn take(&mut self, parent_type: ParentType) -> OrderedCollection {
        self.scopes
            .remove(&parent_type)
            .unwrap_or_else(|| OrderedCollection::new(parent_type, Vec::new()))
    }

    /// Consistency of one scope. A scope with no loaded fields reports as empty.
    pub fn report(&self, parent_type: ParentType) -> ConsistencyReport {
        match self.scopes.get(&parent_type) {
            Some(collection) => collection.check_consistency(),
            None => check_orders(parent_type, []),
        }
    }

    /// One report per parent type, in `ParentType::ALL` order.
    pub fn reports(&self) -> Vec<ConsistencyReport> {
        ParentType::ALL
            .iter()
            .map(|parent_type| self.report(*parent_type))
            .collect()
    }
}

/// Transient set of fields picked for a bulk move. Keeps pick order, rejects
/// fields from other scopes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Selection {
    parent_type: ParentType,
    ids: Vec<FieldId>,
}

impl Selection {
    pub fn new(parent_type: ParentType) -> Self {
        Self {
            parent_type,
            ids: Vec::new(),
        }
    }

    pub fn parent_type(&self) -> ParentType {
        self.parent_type
    }

    pub fn select(&mut self, field: &CustomField) -> bool {
        if field.parent_type != self.parent_type || self.contains(field.id) {
            return false;
        }
        self.ids.push(field.id);
        true
    }

    pub fn deselect(&mut self, id: FieldId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| *selected != id);
        self.ids.len() != before
    }

    /// Returns whether the field is selected afterwards.
    pub fn toggle(&mut self, field: &CustomField) -> bool {
        if self.deselect(field.id) {
            return false;
        }
        self.select(field)
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> &[FieldId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
