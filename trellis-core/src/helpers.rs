//! Small conveniences built on the reactive primitives.

use std::fmt::{self, Display};

use crate::reactive::{Memo, Signal};
use crate::tag::{Child, Platform};

pub use crate::reactive::effect_once;

/// Derived text, recomputed when anything `f` reads changes.
///
/// ```rust
/// use trellis_core::helpers::text;
/// use trellis_core::reactive::Signal;
///
/// let name = Signal::new("Ada".to_string());
/// let reader = name.clone();
/// let greeting = text(move || format!("Hello, {}!", reader.get()));
///
/// assert_eq!(greeting.get(), "Hello, Ada!");
/// name.set("Grace".to_string());
/// assert_eq!(greeting.get(), "Hello, Grace!");
/// ```
pub fn text(f: impl Fn() -> String + 'static) -> Memo<String> {
    Memo::new(f)
}

/// Two-state status, starting `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Toggle {
    #[default]
    Off,
    On,
}

impl Toggle {
    pub fn flipped(self) -> Self {
        match self {
            Toggle::Off => Toggle::On,
            Toggle::On => Toggle::Off,
        }
    }

    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

impl Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Toggle::Off => "off",
            Toggle::On => "on",
        })
    }
}

impl<P: Platform> From<Toggle> for Child<P> {
    fn from(toggle: Toggle) -> Self {
        Child::Text(toggle.to_string())
    }
}

pub fn create_toggle() -> Signal<Toggle> {
    Signal::new(Toggle::Off)
}

/// Flip a toggle signal.
pub fn toggle(signal: &Signal<Toggle>) {
    signal.update(|status| *status = status.flipped());
}
