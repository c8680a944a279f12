//! Rebindable hotkeys.
//!
//! A [`HotkeyId`] names a logical key concept ("move up", "confirm") and maps to a
//! [`KeyBindingPair`] of interchangeable physical keys. The [`HotkeyTable`] owns the
//! current bindings and notifies observers synchronously whenever one changes, strictly
//! after the new value has been stored.

use crate::error::ActionError;
use crate::input::keys::key_name;
use ratatui::crossterm::event::KeyCode;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Logical key concepts that the user may rebind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HotkeyId {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Cancel,
}

impl HotkeyId {
    pub const COUNT: usize = 6;

    pub const ALL: [HotkeyId; Self::COUNT] = [
        HotkeyId::Up,
        HotkeyId::Down,
        HotkeyId::Left,
        HotkeyId::Right,
        HotkeyId::Confirm,
        HotkeyId::Cancel,
    ];

    /// Stable lowercase name used in keymap files.
    pub fn name(self) -> &'static str {
        match self {
            HotkeyId::Up => "up",
            HotkeyId::Down => "down",
            HotkeyId::Left => "left",
            HotkeyId::Right => "right",
            HotkeyId::Confirm => "confirm",
            HotkeyId::Cancel => "cancel",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HotkeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HotkeyId {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        HotkeyId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ActionError::invalid_rebind(s))
    }
}

/// Primary and alternate physical keys for one hotkey. Either slot may be unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyBindingPair {
    pub primary: Option<KeyCode>,
    pub alternate: Option<KeyCode>,
}

impl KeyBindingPair {
    pub const fn new(primary: Option<KeyCode>, alternate: Option<KeyCode>) -> Self {
        Self { primary, alternate }
    }

    pub const fn both(primary: KeyCode, alternate: KeyCode) -> Self {
        Self::new(Some(primary), Some(alternate))
    }

    pub const fn single(primary: KeyCode) -> Self {
        Self::new(Some(primary), None)
    }

    pub const fn unbound() -> Self {
        Self::new(None, None)
    }

    pub fn is_unbound(&self) -> bool {
        self.primary.is_none() && self.alternate.is_none()
    }

    /// True if either bound slot is `key`.
    pub fn contains(&self, key: KeyCode) -> bool {
        self.keys().any(|bound| bound == key)
    }

    /// Bound keys, primary first.
    pub fn keys(&self) -> impl Iterator<Item = KeyCode> {
        self.primary.into_iter().chain(self.alternate)
    }
}

impl fmt::Display for KeyBindingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = |key: Option<KeyCode>| key.map_or_else(|| "-".to_string(), key_name);
        write!(f, "{} / {}", slot(self.primary), slot(self.alternate))
    }
}

/// Hotkeys whose actions fire every frame while held instead of once on release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldableKeySet {
    keys: HashSet<HotkeyId>,
}

impl HoldableKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The directional keys, which continuous navigation needs to poll.
    pub fn navigation() -> Self {
        [HotkeyId::Up, HotkeyId::Down, HotkeyId::Left, HotkeyId::Right]
            .into_iter()
            .collect()
    }

    pub fn contains(&self, id: HotkeyId) -> bool {
        self.keys.contains(&id)
    }
}

impl FromIterator<HotkeyId> for HoldableKeySet {
    fn from_iter<T: IntoIterator<Item = HotkeyId>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Identifier returned by [`HotkeyTable::on_change`].
pub type SubscriptionId = usize;

type Observer = Box<dyn FnMut(KeyBindingPair)>;

struct Subscription {
    id: SubscriptionId,
    hotkey: HotkeyId,
    observer: Observer,
}

/// Current binding of every hotkey, with per-hotkey change observers.
pub struct HotkeyTable {
    bindings: [KeyBindingPair; HotkeyId::COUNT],
    subscriptions: Vec<Subscription>,
    next_subscription: SubscriptionId,
}

impl HotkeyTable {
    /// Table with every hotkey unbound.
    pub fn new() -> Self {
        Self {
            bindings: [KeyBindingPair::unbound(); HotkeyId::COUNT],
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    /// WASD plus arrows for movement, Enter to confirm, Esc to cancel.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for id in HotkeyId::ALL {
            table.bindings[id.index()] = default_binding(id);
        }
        table
    }

    pub fn get(&self, id: HotkeyId) -> KeyBindingPair {
        self.bindings[id.index()]
    }

    /// Store a new binding and notify observers of `id`.
    ///
    /// Returns false, without notifying, when the binding is unchanged.
    pub fn set(&mut self, id: HotkeyId, keys: KeyBindingPair) -> bool {
        if self.bindings[id.index()] == keys {
            return false;
        }
        self.bindings[id.index()] = keys;

        for subscription in self
            .subscriptions
            .iter_mut()
            .filter(|subscription| subscription.hotkey == id)
        {
            (subscription.observer)(keys);
        }
        true
    }

    /// Register an observer invoked with the new pair whenever `id` is rebound.
    pub fn on_change<F>(&mut self, id: HotkeyId, observer: F) -> SubscriptionId
    where
        F: FnMut(KeyBindingPair) + 'static,
    {
        let subscription_id = self.next_subscription;
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id: subscription_id,
            hotkey: id,
            observer: Box::new(observer),
        });
        subscription_id
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|entry| entry.id != subscription);
        self.subscriptions.len() != before
    }

    pub fn observer_count(&self, id: HotkeyId) -> usize {
        self.subscriptions
            .iter()
            .filter(|subscription| subscription.hotkey == id)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HotkeyId, KeyBindingPair)> + '_ {
        HotkeyId::ALL.into_iter().map(|id| (id, self.get(id)))
    }
}

impl Default for HotkeyTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for HotkeyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyTable")
            .field("bindings", &self.bindings)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

fn default_binding(id: HotkeyId) -> KeyBindingPair {
    match id {
        HotkeyId::Up => KeyBindingPair::both(KeyCode::Char('w'), KeyCode::Up),
        HotkeyId::Down => KeyBindingPair::both(KeyCode::Char('s'), KeyCode::Down),
        HotkeyId::Left => KeyBindingPair::both(KeyCode::Char('a'), KeyCode::Left),
        HotkeyId::Right => KeyBindingPair::both(KeyCode::Char('d'), KeyCode::Right),
        HotkeyId::Confirm => KeyBindingPair::single(KeyCode::Enter),
        HotkeyId::Cancel => KeyBindingPair::single(KeyCode::Esc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn defaults_bind_wasd_and_arrows() {
        let table = HotkeyTable::with_defaults();
        let up = table.get(HotkeyId::Up);
        assert!(up.contains(KeyCode::Char('w')));
        assert!(up.contains(KeyCode::Up));
        assert_eq!(table.get(HotkeyId::Cancel), KeyBindingPair::single(KeyCode::Esc));
        assert!(HotkeyTable::new().get(HotkeyId::Up).is_unbound());
    }

    #[test]
    fn set_notifies_only_matching_observers_after_store() {
        let mut table = HotkeyTable::with_defaults();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        table.on_change(HotkeyId::Up, move |keys| sink.borrow_mut().push(keys));
        table.on_change(HotkeyId::Down, |_| panic!("wrong hotkey notified"));

        let rebound = KeyBindingPair::single(KeyCode::Char('i'));
        assert!(table.set(HotkeyId::Up, rebound));
        assert_eq!(table.get(HotkeyId::Up), rebound);
        assert_eq!(*seen.borrow(), vec![rebound]);
    }

    #[test]
    fn unchanged_binding_is_not_renotified() {
        let mut table = HotkeyTable::with_defaults();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        table.on_change(HotkeyId::Confirm, move |_| *counter.borrow_mut() += 1);

        let current = table.get(HotkeyId::Confirm);
        assert!(!table.set(HotkeyId::Confirm, current));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut table = HotkeyTable::new();
        let subscription = table.on_change(HotkeyId::Left, |_| panic!("still subscribed"));
        assert_eq!(table.observer_count(HotkeyId::Left), 1);

        assert!(table.unsubscribe(subscription));
        assert!(!table.unsubscribe(subscription));
        table.set(HotkeyId::Left, KeyBindingPair::single(KeyCode::Char('j')));
    }

    #[test]
    fn hotkey_names_parse() {
        assert_eq!("Confirm".parse::<HotkeyId>().unwrap(), HotkeyId::Confirm);
        assert!(matches!(
            "jump".parse::<HotkeyId>(),
            Err(ActionError::InvalidRebind { .. })
        ));
    }

    #[test]
    fn pair_display_marks_unbound_slots() {
        let pair = KeyBindingPair::single(KeyCode::Char('w'));
        assert_eq!(pair.to_string(), "W / -");
        assert_eq!(pair.keys().collect::<Vec<_>>(), vec![KeyCode::Char('w')]);
    }
}
