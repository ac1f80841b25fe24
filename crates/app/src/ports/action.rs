//! Action handler port: the on/off capability behind an emulated switch.

use fauxplug_domain::relay::RelayState;

/// Capability invoked when the assistant changes a switch's state.
///
/// Both methods report success as a boolean: a failed call makes the
/// switch stay silent, so the client retries or times out.
pub trait ActionHandler: Send {
    /// Switch the controlled resource on.
    fn on(&mut self) -> bool;

    /// Switch the controlled resource off.
    fn off(&mut self) -> bool;

    /// Dispatch to [`on`](Self::on) or [`off`](Self::off).
    fn apply(&mut self, state: RelayState) -> bool {
        match state {
            RelayState::On => self.on(),
            RelayState::Off => self.off(),
        }
    }
}

impl<H: ActionHandler + ?Sized> ActionHandler for Box<H> {
    fn on(&mut self) -> bool {
        (**self).on()
    }

    fn off(&mut self) -> bool {
        (**self).off()
    }
}

/// Handler used by a switch configured without one.
///
/// `on` always fails and `off` always succeeds, so the switch can be told
/// "off" but never "on".
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredHandler;

impl ActionHandler for UnconfiguredHandler {
    fn on(&mut self) -> bool {
        false
    }

    fn off(&mut self) -> bool {
        true
    }
}
