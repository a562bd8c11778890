//! Concrete state handler functions and table builder.
//!
//! ```text
//!  IDLE ──[start]──▶ ACTIVE
//!    ▲                  │
//!    └──────[stop]──────┘
//! ```
//!
//! Stop is checked before start.  The guards are exclusive anyway: stop
//! only applies while Active, start only while Idle.

use super::context::{FsmContext, SessionCommand};
use super::{StateDescriptor, StateId};
use log::info;

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        StateDescriptor {
            id: StateId::Active,
            name: "Active",
            on_enter: Some(active_enter),
            on_exit: Some(active_exit),
            on_update: active_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(_ctx: &mut FsmContext) {
    info!("IDLE: waiting for start");
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.start_event {
        return Some(StateId::Active);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ACTIVE state
// ═══════════════════════════════════════════════════════════════════════════

fn active_enter(ctx: &mut FsmContext) {
    info!("ACTIVE: session start at {}ms", ctx.now_epoch_ms);
    ctx.request(SessionCommand::Open {
        start_ts: ctx.now_epoch_ms,
    });
}

fn active_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.stop_event {
        return Some(StateId::Idle);
    }
    None
}

fn active_exit(ctx: &mut FsmContext) {
    info!("ACTIVE: session stop after {} ticks", ctx.ticks_in_state);
    ctx.request(SessionCommand::Close);
}
