//! Two-way binding between a string signal and an `<input>`.

use std::rc::Rc;

use super::node::{Event, Listener};
use super::value::Value;
use super::Dom;
use crate::config::RenderConfig;
use crate::error::platform_assert;
use crate::reactive::{Memo, ReadSignal, Signal};
use crate::tag::PropValue;

/// The props binding an input to a signal.
pub struct SyncValue {
    /// Current text, for the `value` prop.
    pub value: Memo<String>,
    /// Writes the input's text back into the signal.
    pub on_input: Listener,
}

impl SyncValue {
    /// `value` and `{event_prefix}input` props, ready for [`TagDescriptor::props`].
    ///
    /// [`TagDescriptor::props`]: crate::tag::TagDescriptor::props
    pub fn into_props(self, config: &RenderConfig) -> [(String, PropValue<Dom>); 2] {
        [
            (
                "value".to_string(),
                PropValue::Tracked(ReadSignal::from(self.value).map(Value::from)),
            ),
            (
                format!("{}input", config.event_prefix),
                PropValue::Listener(self.on_input),
            ),
        ]
    }
}

/// Bind `signal` to an input element.
///
/// # Panics
///
/// The listener panics when it receives an event whose target is not an
/// `input` element.
pub fn sync_value(signal: &Signal<String>) -> SyncValue {
    let reader = signal.clone();
    let writer = signal.clone();

    SyncValue {
        value: Memo::new(move || reader.get()),
        on_input: Rc::new(move |event: &Event| {
            platform_assert(
                event.target.tag_name() == Some("input"),
                "sync_value can only be used with input elements",
            );
            writer.set(event.target.value());
        }),
    }
}
