//! Registry of action definitions, kept in sync with hotkey bindings.
//!
//! Actions are stored in registration order, which is also the order the evaluator
//! walks them. Hotkey-derived actions refer to their hotkey by id; the registry keeps
//! one resolved expression per hotkey and rebuilds it whenever the binding changes, so
//! every dependent action sees the new binding on the next evaluated frame.

use crate::action::expression::{
    ActionExpression, CompositeOp, EventPattern, RealtimePredicate, TriggerMode,
};
use crate::action::ActionId;
use crate::hotkeys::{HoldableKeySet, HotkeyId, KeyBindingPair};
use log::debug;
use std::collections::HashMap;

/// A registered action and the expression that satisfies it.
#[derive(Debug, Clone)]
pub struct ActionDefinition {
    pub id: ActionId,
    pub expression: ActionExpression,
}

/// Current binding of one hotkey and the expression built from it.
#[derive(Debug, Clone)]
struct KeyAction {
    keys: KeyBindingPair,
    mode: TriggerMode,
    expression: ActionExpression,
}

#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    definitions: Vec<ActionDefinition>,
    key_map: HashMap<HotkeyId, KeyAction>,
    holdable: HoldableKeySet,
}

impl ActionRegistry {
    pub fn new(holdable: HoldableKeySet) -> Self {
        Self {
            definitions: Vec::new(),
            key_map: HashMap::new(),
            holdable,
        }
    }

    /// Action triggered by a discrete event.
    pub fn register_event(&mut self, id: ActionId, pattern: EventPattern) {
        self.register(id, ActionExpression::RawEvent(pattern));
    }

    /// Action polled against device state every frame.
    pub fn register_realtime(&mut self, id: ActionId, predicate: RealtimePredicate) {
        self.register(id, ActionExpression::Realtime(predicate));
    }

    /// Action triggered when `left` and `right` both trigger in the same frame.
    pub fn register_composite(
        &mut self,
        id: ActionId,
        op: CompositeOp,
        left: ActionId,
        right: ActionId,
    ) {
        self.register(id, ActionExpression::Composite { op, left, right });
    }

    /// Action driven by whatever `hotkey` is currently bound to.
    pub fn register_hotkey(&mut self, id: ActionId, hotkey: HotkeyId) {
        self.register(id, ActionExpression::Hotkey(hotkey));
    }

    /// Insert or replace a definition. Replacing keeps the existing evaluation slot.
    pub fn register(&mut self, id: ActionId, expression: ActionExpression) {
        match self.definitions.iter_mut().find(|definition| definition.id == id) {
            Some(existing) => existing.expression = expression,
            None => self.definitions.push(ActionDefinition { id, expression }),
        }
    }

    pub fn unregister(&mut self, id: ActionId) -> Option<ActionDefinition> {
        let index = self
            .definitions
            .iter()
            .position(|definition| definition.id == id)?;
        Some(self.definitions.remove(index))
    }

    /// Recompute the expression for `hotkey` from its new binding.
    ///
    /// Holdable hotkeys poll the keys every frame; all others fire on release. Returns
    /// every registered action whose outcome depends on the hotkey, in evaluation order.
    pub fn rebuild_for_key(&mut self, hotkey: HotkeyId, keys: KeyBindingPair) -> Vec<ActionId> {
        let mode = if self.holdable.contains(hotkey) {
            TriggerMode::Hold
        } else {
            TriggerMode::ReleaseOnce
        };

        self.key_map.insert(
            hotkey,
            KeyAction {
                keys,
                mode,
                expression: ActionExpression::for_keys(keys, mode),
            },
        );

        let affected = self.dependents_of(hotkey);
        debug!("hotkey {hotkey} bound to {keys} ({mode:?}), affects {affected:?}");
        affected
    }

    /// Actions that depend on `hotkey` directly or through a composite.
    pub fn dependents_of(&self, hotkey: HotkeyId) -> Vec<ActionId> {
        let mut dependents: Vec<ActionId> = self
            .definitions
            .iter()
            .filter(|definition| definition.expression.depends_on_hotkey(hotkey))
            .map(|definition| definition.id)
            .collect();

        loop {
            let before = dependents.len();
            for definition in &self.definitions {
                if dependents.contains(&definition.id) {
                    continue;
                }
                if let ActionExpression::Composite { left, right, .. } = definition.expression {
                    if dependents.contains(&left) || dependents.contains(&right) {
                        dependents.push(definition.id);
                    }
                }
            }
            if dependents.len() == before {
                break;
            }
        }

        dependents.sort_by_key(|id| self.position(*id));
        dependents
    }

    pub fn definition(&self, id: ActionId) -> Option<&ActionDefinition> {
        self.definitions.iter().find(|definition| definition.id == id)
    }

    pub fn expression(&self, id: ActionId) -> Option<&ActionExpression> {
        self.definition(id).map(|definition| &definition.expression)
    }

    /// Expression currently built for `hotkey`; unbound until first rebuilt.
    pub fn hotkey_expression(&self, hotkey: HotkeyId) -> &ActionExpression {
        const UNBOUND: &ActionExpression = &ActionExpression::Unbound;
        self.key_map
            .get(&hotkey)
            .map_or(UNBOUND, |key_action| &key_action.expression)
    }

    pub fn hotkey_keys(&self, hotkey: HotkeyId) -> Option<KeyBindingPair> {
        self.key_map.get(&hotkey).map(|key_action| key_action.keys)
    }

    /// Resolved trigger mode, or `None` for actions that can never fire.
    pub fn trigger_mode(&self, id: ActionId) -> Option<TriggerMode> {
        self.resolve_mode(self.expression(id)?, self.definitions.len())
    }

    fn resolve_mode(&self, expression: &ActionExpression, depth: usize) -> Option<TriggerMode> {
        match expression {
            ActionExpression::RawEvent(pattern) => Some(pattern.trigger_mode()),
            ActionExpression::Realtime(_) => Some(TriggerMode::Hold),
            ActionExpression::Hotkey(hotkey) => {
                let key_action = self.key_map.get(hotkey)?;
                match key_action.expression {
                    ActionExpression::Unbound => None,
                    _ => Some(key_action.mode),
                }
            }
            ActionExpression::Composite { left, right, .. } => {
                let depth = depth.checked_sub(1)?;
                let left = self.resolve_mode(self.expression(*left)?, depth)?;
                let right = self.resolve_mode(self.expression(*right)?, depth)?;
                // A composite fires at the pace of its event-driven side.
                Some(if left == TriggerMode::Hold { right } else { left })
            }
            ActionExpression::Unbound => None,
        }
    }

    /// Registered actions in evaluation order.
    pub fn actions(&self) -> impl Iterator<Item = ActionId> + '_ {
        self.definitions.iter().map(|definition| definition.id)
    }

    pub fn definitions(&self) -> &[ActionDefinition] {
        &self.definitions
    }

    pub fn holdable(&self) -> &HoldableKeySet {
        &self.holdable
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    fn position(&self, id: ActionId) -> usize {
        self.definitions
            .iter()
            .position(|definition| definition.id == id)
            .unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::EventKind;
    use ratatui::crossterm::event::{KeyCode, MouseButton};

    fn registry() -> ActionRegistry {
        ActionRegistry::new(HoldableKeySet::navigation())
    }

    #[test]
    fn registration_order_is_preserved_on_replace() {
        let mut registry = registry();
        registry.register_event(ActionId::Quit, EventPattern::new(EventKind::Closed));
        registry.register_event(ActionId::Resize, EventPattern::new(EventKind::Resized));
        registry.register_event(ActionId::Quit, EventPattern::key_released(KeyCode::Char('q')));

        assert_eq!(
            registry.actions().collect::<Vec<_>>(),
            vec![ActionId::Quit, ActionId::Resize]
        );
        assert!(matches!(
            registry.expression(ActionId::Quit),
            Some(ActionExpression::RawEvent(pattern)) if pattern.kind == EventKind::KeyReleased
        ));
    }

    #[test]
    fn holdable_keys_rebuild_as_hold() {
        let mut registry = registry();
        registry.register_hotkey(ActionId::NavUp, HotkeyId::Up);
        registry.register_hotkey(ActionId::Enter, HotkeyId::Confirm);

        registry.rebuild_for_key(HotkeyId::Up, KeyBindingPair::single(KeyCode::Char('w')));
        registry.rebuild_for_key(HotkeyId::Confirm, KeyBindingPair::single(KeyCode::Enter));

        assert_eq!(registry.trigger_mode(ActionId::NavUp), Some(TriggerMode::Hold));
        assert_eq!(
            registry.trigger_mode(ActionId::Enter),
            Some(TriggerMode::ReleaseOnce)
        );
        assert!(matches!(
            registry.hotkey_expression(HotkeyId::Up),
            ActionExpression::Realtime(RealtimePredicate::Keys(_))
        ));
    }

    #[test]
    fn unbound_hotkey_has_no_mode() {
        let mut registry = registry();
        registry.register_hotkey(ActionId::NavLeft, HotkeyId::Left);
        assert_eq!(registry.trigger_mode(ActionId::NavLeft), None);

        registry.rebuild_for_key(HotkeyId::Left, KeyBindingPair::unbound());
        assert_eq!(registry.trigger_mode(ActionId::NavLeft), None);
        assert!(matches!(
            registry.hotkey_expression(HotkeyId::Left),
            ActionExpression::Unbound
        ));
    }

    #[test]
    fn rebuild_reports_direct_and_composite_dependents() {
        let mut registry = registry();
        registry.register_hotkey(ActionId::NavUp, HotkeyId::Up);
        registry.register_realtime(
            ActionId::MouseCommand,
            RealtimePredicate::Button(MouseButton::Right),
        );
        registry.register_composite(
            ActionId::MousePan,
            CompositeOp::And,
            ActionId::MouseCommand,
            ActionId::NavUp,
        );
        registry.register_hotkey(ActionId::NavDown, HotkeyId::Down);

        let affected =
            registry.rebuild_for_key(HotkeyId::Up, KeyBindingPair::single(KeyCode::Up));
        assert_eq!(affected, vec![ActionId::NavUp, ActionId::MousePan]);
    }

    #[test]
    fn composite_takes_event_side_mode() {
        let mut registry = registry();
        registry.register_realtime(
            ActionId::MouseCommand,
            RealtimePredicate::Button(MouseButton::Right),
        );
        registry.register_event(ActionId::MouseMove, EventPattern::new(EventKind::MouseMoved));
        registry.register_composite(
            ActionId::MousePan,
            CompositeOp::And,
            ActionId::MouseCommand,
            ActionId::MouseMove,
        );

        assert_eq!(
            registry.trigger_mode(ActionId::MousePan),
            Some(TriggerMode::EventOnce)
        );
    }

    #[test]
    fn self_referencing_composite_has_no_mode() {
        let mut registry = registry();
        registry.register_composite(
            ActionId::MousePan,
            CompositeOp::And,
            ActionId::MousePan,
            ActionId::MousePan,
        );
        assert_eq!(registry.trigger_mode(ActionId::MousePan), None);
    }

    #[test]
    fn unregister_removes_definition() {
        let mut registry = registry();
        registry.register_event(ActionId::Quit, EventPattern::new(EventKind::Closed));
        assert!(registry.unregister(ActionId::Quit).is_some());
        assert!(registry.unregister(ActionId::Quit).is_none());
        assert!(registry.is_empty());
    }
}
