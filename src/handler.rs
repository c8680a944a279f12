//! Frame-level facade tying hotkeys, action definitions, the evaluator and the
//! dispatcher together.
//!
//! A host drives one [`ActionHandler`] per frame:
//!
//! 1. [`clear_events`](ActionHandler::clear_events)
//! 2. [`push_event`](ActionHandler::push_event) for every event since the last frame
//! 3. [`invoke_callbacks`](ActionHandler::invoke_callbacks) with the current device state
//!
//! Hotkey changes arrive through a channel fed by the [`HotkeyTable`] observers and are
//! applied at the start of `invoke_callbacks`. A rebind made by a handler during dispatch
//! therefore takes effect on the following frame, never halfway through the current one.

use crate::action::{
    ActionContext, ActionId, ActionRegistry, CompositeOp, EventPattern, RealtimePredicate,
};
use crate::app::{AppCallbacks, Direction};
use crate::dispatch::{Dispatcher, HandlerFailure, HandlerResult};
use crate::error::{ActionError, Result};
use crate::evaluator::FrameEvaluator;
use crate::hotkeys::{HoldableKeySet, HotkeyId, HotkeyTable, KeyBindingPair, SubscriptionId};
use crate::input::event::{DeviceState, EventKind, InputEvent};
use anyhow::Context as _;
use log::{debug, trace};
use ratatui::crossterm::event::MouseButton;
use std::cell::{RefCell, RefMut};
use std::rc::Rc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A pending hotkey change.
pub type Rebind = (HotkeyId, KeyBindingPair);

type MouseCallback<A> = fn(&mut A, &ActionContext) -> HandlerResult;

/// Outcome of one frame's dispatch.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Actions that triggered, in evaluation order.
    pub fired: Vec<ActionId>,
    /// Handler errors collected while dispatching.
    pub failures: Vec<HandlerFailure>,
}

impl FrameReport {
    pub fn has_fired(&self, action: ActionId) -> bool {
        self.fired.contains(&action)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn collected failures into an error naming the first one.
    pub fn into_result(self) -> Result<Vec<ActionId>> {
        match self.failures.first() {
            Some(first) => Err(ActionError::HandlerFailed {
                action: first.action,
                count: self.failures.len(),
                message: format!("{:#}", first.error),
            }),
            None => Ok(self.fired),
        }
    }
}

#[derive(Debug)]
pub struct ActionHandler {
    registry: ActionRegistry,
    dispatcher: Dispatcher,
    evaluator: FrameEvaluator,
    rebind_tx: UnboundedSender<Rebind>,
    rebind_rx: UnboundedReceiver<Rebind>,
    subscriptions: Vec<SubscriptionId>,
}

impl ActionHandler {
    /// Handler with no actions, tracking every hotkey of `hotkeys`.
    pub fn new(hotkeys: &mut HotkeyTable, holdable: HoldableKeySet) -> Self {
        let (rebind_tx, rebind_rx) = mpsc::unbounded_channel();
        let mut registry = ActionRegistry::new(holdable);
        let mut subscriptions = Vec::with_capacity(HotkeyId::COUNT);

        for id in HotkeyId::ALL {
            registry.rebuild_for_key(id, hotkeys.get(id));

            let tx = rebind_tx.clone();
            subscriptions.push(hotkeys.on_change(id, move |keys| {
                if tx.send((id, keys)).is_err() {
                    debug!("action handler dropped, ignoring rebind of {id}");
                }
            }));
        }

        Self {
            registry,
            dispatcher: Dispatcher::new(),
            evaluator: FrameEvaluator::new(),
            rebind_tx,
            rebind_rx,
            subscriptions,
        }
    }

    /// Handler with the default action set wired to `app`.
    pub fn with_app<A>(hotkeys: &mut HotkeyTable, app: Rc<RefCell<A>>) -> Self
    where
        A: AppCallbacks + 'static,
    {
        let mut handler = Self::new(hotkeys, HoldableKeySet::navigation());
        handler.register_default_actions();
        handler.connect_app(app);
        handler
    }

    /// Window events, hotkey-driven keyboard actions and the mouse actions.
    pub fn register_default_actions(&mut self) {
        let registry = &mut self.registry;

        registry.register_event(ActionId::Quit, EventPattern::new(EventKind::Closed));
        registry.register_event(ActionId::Resize, EventPattern::new(EventKind::Resized));

        registry.register_hotkey(ActionId::Enter, HotkeyId::Confirm);
        registry.register_hotkey(ActionId::Escape, HotkeyId::Cancel);
        registry.register_hotkey(ActionId::NavUp, HotkeyId::Up);
        registry.register_hotkey(ActionId::NavDown, HotkeyId::Down);
        registry.register_hotkey(ActionId::NavLeft, HotkeyId::Left);
        registry.register_hotkey(ActionId::NavRight, HotkeyId::Right);

        registry.register_event(ActionId::MouseMove, EventPattern::new(EventKind::MouseMoved));
        registry.register_realtime(
            ActionId::MouseSelect,
            RealtimePredicate::Button(MouseButton::Left),
        );
        registry.register_composite(
            ActionId::MouseSelectDrag,
            CompositeOp::And,
            ActionId::MouseSelect,
            ActionId::MouseMove,
        );
        registry.register_realtime(
            ActionId::MouseCommand,
            RealtimePredicate::Button(MouseButton::Right),
        );
        registry.register_composite(
            ActionId::MousePan,
            CompositeOp::And,
            ActionId::MouseCommand,
            ActionId::MouseMove,
        );
        registry.register_event(
            ActionId::MouseScroll,
            EventPattern::new(EventKind::MouseWheelScrolled),
        );
    }

    /// Subscribe each [`AppCallbacks`] method to its action.
    pub fn connect_app<A>(&mut self, app: Rc<RefCell<A>>)
    where
        A: AppCallbacks + 'static,
    {
        let dispatcher = &mut self.dispatcher;

        let target = Rc::clone(&app);
        dispatcher.subscribe(ActionId::Quit, move || borrow_app(&target)?.on_quit());
        let target = Rc::clone(&app);
        dispatcher.subscribe_with_context(ActionId::Resize, move |context| {
            borrow_app(&target)?.on_resize(context)
        });
        let target = Rc::clone(&app);
        dispatcher.subscribe(ActionId::Enter, move || borrow_app(&target)?.on_enter());
        let target = Rc::clone(&app);
        dispatcher.subscribe(ActionId::Escape, move || borrow_app(&target)?.on_escape());

        for (action, direction) in [
            (ActionId::NavUp, Direction::Up),
            (ActionId::NavDown, Direction::Down),
            (ActionId::NavLeft, Direction::Left),
            (ActionId::NavRight, Direction::Right),
        ] {
            let target = Rc::clone(&app);
            dispatcher.subscribe(action, move || borrow_app(&target)?.on_nav(direction));
        }

        let mouse: [(ActionId, MouseCallback<A>); 6] = [
            (ActionId::MouseMove, A::on_mouse_move),
            (ActionId::MouseSelect, A::on_mouse_select),
            (ActionId::MouseSelectDrag, A::on_mouse_select_drag),
            (ActionId::MouseCommand, A::on_mouse_command),
            (ActionId::MousePan, A::on_mouse_pan),
            (ActionId::MouseScroll, A::on_mouse_scroll),
        ];
        for (action, callback) in mouse {
            let target = Rc::clone(&app);
            dispatcher.subscribe_with_context(action, move |context| {
                callback(&mut *borrow_app(&target)?, context)
            });
        }
    }

    /// Begin a frame.
    pub fn clear_events(&mut self) {
        self.evaluator.clear_events();
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.evaluator.push_event(event);
    }

    /// Apply queued hotkey changes, returning how many were applied.
    pub fn apply_pending_rebinds(&mut self) -> usize {
        let mut applied = 0;
        while let Ok((id, keys)) = self.rebind_rx.try_recv() {
            self.registry.rebuild_for_key(id, keys);
            applied += 1;
        }
        applied
    }

    /// Sender for posting rebinds from outside the hotkey table, including other threads.
    pub fn rebinder(&self) -> UnboundedSender<Rebind> {
        self.rebind_tx.clone()
    }

    /// Evaluate this frame's actions and run their handlers.
    pub fn invoke_callbacks(&mut self, device: &dyn DeviceState) -> FrameReport {
        self.apply_pending_rebinds();

        let triggers = self.evaluator.evaluate(&self.registry, device);
        let mut report = FrameReport::default();
        for trigger in triggers {
            trace!("{} fired with {:?}", trigger.action, trigger.context);
            let failures = self.dispatcher.fire(trigger.action, &trigger.context);
            report.failures.extend(failures);
            report.fired.push(trigger.action);
        }
        report
    }

    /// Stop observing `hotkeys`. Later rebinds in that table are no longer seen.
    pub fn detach(&mut self, hotkeys: &mut HotkeyTable) {
        for subscription in self.subscriptions.drain(..) {
            hotkeys.unsubscribe(subscription);
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ActionRegistry {
        &mut self.registry
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn evaluator(&self) -> &FrameEvaluator {
        &self.evaluator
    }
}

fn borrow_app<A>(app: &RefCell<A>) -> anyhow::Result<RefMut<'_, A>> {
    app.try_borrow_mut()
        .context("application state is already borrowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{DeviceSnapshot, Point};
    use anyhow::bail;
    use ratatui::crossterm::event::KeyCode;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_enter: bool,
    }

    impl AppCallbacks for Recorder {
        fn on_quit(&mut self) -> HandlerResult {
            self.calls.push("quit".into());
            Ok(())
        }

        fn on_enter(&mut self) -> HandlerResult {
            if self.fail_enter {
                bail!("enter rejected");
            }
            self.calls.push("enter".into());
            Ok(())
        }

        fn on_nav(&mut self, direction: Direction) -> HandlerResult {
            self.calls.push(format!("nav {direction}"));
            Ok(())
        }

        fn on_mouse_scroll(&mut self, context: &ActionContext) -> HandlerResult {
            self.calls.push(format!("scroll {}", context.scroll));
            Ok(())
        }
    }

    fn setup() -> (HotkeyTable, Rc<RefCell<Recorder>>, ActionHandler) {
        let mut hotkeys = HotkeyTable::with_defaults();
        let app = Rc::new(RefCell::new(Recorder::default()));
        let handler = ActionHandler::with_app(&mut hotkeys, Rc::clone(&app));
        (hotkeys, app, handler)
    }

    #[test]
    fn default_actions_reach_the_app() {
        let (_hotkeys, app, mut handler) = setup();
        let mut device = DeviceSnapshot::new();
        device.press_key(KeyCode::Left);

        handler.clear_events();
        handler.push_event(InputEvent::Closed);
        handler.push_event(InputEvent::MouseWheelScrolled {
            delta: 1.0,
            position: Point::ZERO,
        });
        let report = handler.invoke_callbacks(&device);

        assert!(report.is_clean());
        assert_eq!(
            report.fired,
            vec![ActionId::Quit, ActionId::NavLeft, ActionId::MouseScroll]
        );
        assert_eq!(app.borrow().calls, vec!["quit", "nav left", "scroll 1"]);
    }

    #[test]
    fn failures_are_reported_not_fatal() {
        let (_hotkeys, app, mut handler) = setup();
        app.borrow_mut().fail_enter = true;

        handler.clear_events();
        handler.push_event(InputEvent::KeyReleased(KeyCode::Enter));
        handler.push_event(InputEvent::Closed);
        let report = handler.invoke_callbacks(&DeviceSnapshot::new());

        assert_eq!(report.failures.len(), 1);
        assert_eq!(app.borrow().calls, vec!["quit"]);
        match report.into_result() {
            Err(ActionError::HandlerFailed { action, count, message }) => {
                assert_eq!(action, ActionId::Enter);
                assert_eq!(count, 1);
                assert_eq!(message, "enter rejected");
            }
            other => panic!("expected handler failure, got {other:?}"),
        }
    }

    #[test]
    fn app_borrowed_elsewhere_is_a_handler_failure() {
        let (_hotkeys, app, mut handler) = setup();
        let _guard = app.borrow_mut();

        handler.clear_events();
        handler.push_event(InputEvent::Closed);
        let report = handler.invoke_callbacks(&DeviceSnapshot::new());
        assert_eq!(report.fired, vec![ActionId::Quit]);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn rebinds_apply_at_next_evaluation() {
        let (mut hotkeys, _app, mut handler) = setup();
        hotkeys.set(HotkeyId::Up, KeyBindingPair::single(KeyCode::Char('i')));
        assert_eq!(
            handler.registry().hotkey_keys(HotkeyId::Up),
            Some(KeyBindingPair::both(KeyCode::Char('w'), KeyCode::Up))
        );

        assert_eq!(handler.apply_pending_rebinds(), 1);
        assert_eq!(
            handler.registry().hotkey_keys(HotkeyId::Up),
            Some(KeyBindingPair::single(KeyCode::Char('i')))
        );
    }

    #[test]
    fn rebinder_accepts_posts_from_other_threads() {
        let (_hotkeys, _app, mut handler) = setup();
        let rebinder = handler.rebinder();

        std::thread::spawn(move || {
            rebinder
                .send((HotkeyId::Cancel, KeyBindingPair::single(KeyCode::Char('x'))))
                .unwrap();
        })
        .join()
        .unwrap();

        handler.invoke_callbacks(&DeviceSnapshot::new());
        assert_eq!(
            handler.registry().hotkey_keys(HotkeyId::Cancel),
            Some(KeyBindingPair::single(KeyCode::Char('x')))
        );
    }

    #[test]
    fn detach_stops_tracking_the_table() {
        let (mut hotkeys, _app, mut handler) = setup();
        handler.detach(&mut hotkeys);
        assert_eq!(hotkeys.observer_count(HotkeyId::Up), 0);

        hotkeys.set(HotkeyId::Up, KeyBindingPair::unbound());
        assert_eq!(handler.apply_pending_rebinds(), 0);
    }
}
