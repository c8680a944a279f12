//! Callback table: ordered handlers per action.
//!
//! Handlers run synchronously on the calling thread, in subscription order. A handler
//! returning an error is logged and recorded as a [`HandlerFailure`]; the remaining
//! handlers still run.

use crate::action::{ActionContext, ActionId};
use log::warn;
use std::collections::HashMap;
use std::fmt;

/// Result type returned by application handlers.
pub type HandlerResult = anyhow::Result<()>;

/// Identifies one subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

enum Handler {
    Plain(Box<dyn FnMut() -> HandlerResult>),
    Contextual(Box<dyn FnMut(&ActionContext) -> HandlerResult>),
}

impl Handler {
    fn call(&mut self, context: &ActionContext) -> HandlerResult {
        match self {
            Handler::Plain(handler) => handler(),
            Handler::Contextual(handler) => handler(context),
        }
    }
}

struct Subscription {
    token: SubscriptionToken,
    handler: Handler,
}

/// A handler error captured during dispatch.
#[derive(Debug)]
pub struct HandlerFailure {
    pub action: ActionId,
    pub token: SubscriptionToken,
    pub error: anyhow::Error,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler {:?} for {} failed: {:#}", self.token, self.action, self.error)
    }
}

#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<ActionId, Vec<Subscription>>,
    next_token: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler that ignores the trigger context.
    pub fn subscribe<F>(&mut self, action: ActionId, handler: F) -> SubscriptionToken
    where
        F: FnMut() -> HandlerResult + 'static,
    {
        self.insert(action, Handler::Plain(Box::new(handler)))
    }

    /// Append a handler that receives the trigger context.
    pub fn subscribe_with_context<F>(&mut self, action: ActionId, handler: F) -> SubscriptionToken
    where
        F: FnMut(&ActionContext) -> HandlerResult + 'static,
    {
        self.insert(action, Handler::Contextual(Box::new(handler)))
    }

    fn insert(&mut self, action: ActionId, handler: Handler) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.handlers
            .entry(action)
            .or_default()
            .push(Subscription { token, handler });
        token
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        for subscriptions in self.handlers.values_mut() {
            if let Some(index) = subscriptions.iter().position(|entry| entry.token == token) {
                subscriptions.remove(index);
                return true;
            }
        }
        false
    }

    /// Invoke every handler of `action` in subscription order.
    pub fn fire(&mut self, action: ActionId, context: &ActionContext) -> Vec<HandlerFailure> {
        let Some(subscriptions) = self.handlers.get_mut(&action) else {
            return Vec::new();
        };

        let mut failures = Vec::new();
        for subscription in subscriptions.iter_mut() {
            if let Err(error) = subscription.handler.call(context) {
                let failure = HandlerFailure {
                    action,
                    token: subscription.token,
                    error,
                };
                warn!("{failure}");
                failures.push(failure);
            }
        }
        failures
    }

    pub fn handler_count(&self, action: ActionId) -> usize {
        self.handlers.get(&action).map_or(0, Vec::len)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<ActionId, usize> = self
            .handlers
            .iter()
            .map(|(action, subscriptions)| (*action, subscriptions.len()))
            .collect();
        f.debug_struct("Dispatcher")
            .field("handlers", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::Point;
    use anyhow::bail;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn handlers_run_in_subscription_order() {
        let mut dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            dispatcher.subscribe(ActionId::Enter, move || {
                log.borrow_mut().push(label);
                Ok(())
            });
        }

        let failures = dispatcher.fire(ActionId::Enter, &ActionContext::default());
        assert!(failures.is_empty());
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn failing_handler_does_not_stop_the_rest() {
        let mut dispatcher = Dispatcher::new();
        let ran = Rc::new(RefCell::new(false));

        let failing = dispatcher.subscribe(ActionId::Quit, || bail!("save failed"));
        let flag = Rc::clone(&ran);
        dispatcher.subscribe(ActionId::Quit, move || {
            *flag.borrow_mut() = true;
            Ok(())
        });

        let failures = dispatcher.fire(ActionId::Quit, &ActionContext::default());
        assert!(*ran.borrow());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].token, failing);
        assert_eq!(failures[0].action, ActionId::Quit);
        assert!(failures[0].to_string().contains("save failed"));
    }

    #[test]
    fn context_reaches_contextual_handlers() {
        let mut dispatcher = Dispatcher::new();
        let seen = Rc::new(RefCell::new(None));

        let sink = Rc::clone(&seen);
        dispatcher.subscribe_with_context(ActionId::MouseMove, move |context| {
            *sink.borrow_mut() = Some(context.delta);
            Ok(())
        });

        let context = ActionContext {
            delta: Point::new(2, -1),
            ..ActionContext::default()
        };
        dispatcher.fire(ActionId::MouseMove, &context);
        assert_eq!(*seen.borrow(), Some(Point::new(2, -1)));
    }

    #[test]
    fn unsubscribe_by_token() {
        let mut dispatcher = Dispatcher::new();
        let token = dispatcher.subscribe(ActionId::Escape, || panic!("should be removed"));
        dispatcher.subscribe(ActionId::Escape, || Ok(()));
        assert_eq!(dispatcher.handler_count(ActionId::Escape), 2);

        assert!(dispatcher.unsubscribe(token));
        assert!(!dispatcher.unsubscribe(token));
        assert_eq!(dispatcher.handler_count(ActionId::Escape), 1);
        assert!(dispatcher
            .fire(ActionId::Escape, &ActionContext::default())
            .is_empty());
    }

    #[test]
    fn firing_without_handlers_is_a_no_op() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher
            .fire(ActionId::Resize, &ActionContext::default())
            .is_empty());
    }
}
