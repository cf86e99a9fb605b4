//! Device mode transitions.
//!
//! Owns the `device_mode` pipe. Changes that need the user's consent go
//! through an asynchronous confirmation dialog: the dialog is opened, the
//! `MODECHG` submode flag is raised and the caller's reply is parked until the
//! dialog reports back through [`ModeTransition::dialog_result`]. At most one
//! change is in flight.

use crate::{
    config::ModeConfig,
    context::Services,
    datapipe::Subsystem,
    ipc::{MethodReply, ModeChangeResult, ModeTransitionTag, Responder, Signal, UiRequest, respond},
    submode::{Submode, SubmodeChange},
    timer::Moment,
    types::DeviceMode,
};

const ORIGIN: Subsystem = Subsystem::ModeTransition;

/// Mode change waiting for the dialog result.
#[derive(Debug)]
struct PendingChange {
    target: DeviceMode,
    reply: Option<Responder>,
}

/// Device mode state machine.
#[derive(Debug)]
pub struct ModeTransition {
    config: ModeConfig,
    pending: Option<PendingChange>,
}

impl ModeTransition {
    /// Machine with nothing pending.
    pub fn new(config: ModeConfig) -> Self {
        Self { config, pending: None }
    }

    /// Whether a confirmation dialog result is awaited.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Mode the pending change would settle in.
    pub fn pending_target(&self) -> Option<DeviceMode> {
        self.pending.as_ref().map(|p| p.target)
    }

    /// Load the persisted mode into the `device_mode` pipe.
    pub fn restore<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        let saved = match svc.store.read_string(&self.config.mode_file) {
            Ok(Some(saved)) => saved,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%err, "cannot read saved device mode");
                return;
            },
        };

        match DeviceMode::parse(&saved).target() {
            DeviceMode::Invalid => {
                tracing::warn!(saved = %saved, "ignoring unknown saved device mode");
            },
            mode => {
                tracing::info!(%mode, "restored device mode");
                svc.pipes.device_mode.set(ORIGIN, mode);
            },
        }
    }

    /// Handle a mode change request. `reply` receives `Ack(true)` once the
    /// change is applied, `Ack(false)` if it is refused or aborted.
    pub fn set_device_mode<M: Moment>(
        &mut self,
        svc: &mut Services<'_, M>,
        requested: DeviceMode,
        reply: Option<Responder>,
    ) {
        if requested == DeviceMode::Invalid {
            tracing::error!("invalid device mode requested");
            respond(reply, MethodReply::Ack(false));
            return;
        }

        if self.pending.is_some() || svc.pipes.has_submode(Submode::MODECHG) {
            tracing::warn!(%requested, "mode change already in progress");
            respond(reply, MethodReply::Ack(false));
            return;
        }

        let current = svc.pipes.device_mode.get();
        if requested.target() == current {
            tracing::debug!(%current, "device mode unchanged");
            svc.pipes.device_mode.reannounce(ORIGIN);
            svc.ui.emit(Signal::DeviceMode(current));
            respond(reply, MethodReply::Ack(true));
            return;
        }

        let transition = match requested {
            DeviceMode::NormalConfirm => Some(ModeTransitionTag::ToNormal),
            DeviceMode::FlightConfirm if svc.pipes.connectivity_active.get() => {
                Some(ModeTransitionTag::ToFlight)
            },
            _ => None,
        };

        let Some(transition) = transition else {
            self.apply(svc, requested.target(), reply);
            return;
        };

        let request =
            UiRequest::OpenModeDialog { transition, callback: self.config.dialog_callback.clone() };
        if let Err(err) = svc.ui.call(&request) {
            tracing::warn!(%err, ?transition, "cannot open mode change dialog");
            respond(reply, MethodReply::Ack(false));
            return;
        }

        if !svc.update_submode(ORIGIN, SubmodeChange::set(Submode::MODECHG)) {
            respond(reply, MethodReply::Ack(false));
            return;
        }
        tracing::debug!(?transition, "awaiting mode change confirmation");
        self.pending = Some(PendingChange { target: requested.target(), reply });
    }

    /// Result of the confirmation dialog.
    pub fn dialog_result<M: Moment>(&mut self, svc: &mut Services<'_, M>, code: i32) {
        let Some(PendingChange { target, reply }) = self.pending.take() else {
            tracing::error!(code, "mode change callback with nothing pending");
            return;
        };

        match ModeChangeResult::from(code) {
            ModeChangeResult::Ok => self.apply(svc, target, reply),
            ModeChangeResult::Cancel => {
                tracing::info!(%target, "mode change cancelled");
                if let Err(err) = svc.ui.call(&UiRequest::CloseModeDialog) {
                    tracing::warn!(%err, "cannot close mode change dialog");
                }
                svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::MODECHG));
                let current = svc.pipes.device_mode.reannounce(ORIGIN);
                svc.ui.emit(Signal::DeviceMode(current));
                respond(reply, MethodReply::Ack(false));
            },
        }
    }

    /// Ask the state manager to shut the device down.
    pub fn request_shutdown<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        tracing::info!("requesting shutdown");
        if let Err(err) = svc.ui.call(&UiRequest::RequestShutdown) {
            tracing::error!(%err, "shutdown request failed");
            return;
        }
        svc.update_submode(ORIGIN, SubmodeChange::set(Submode::TRANSITION));
    }

    fn apply<M: Moment>(
        &mut self,
        svc: &mut Services<'_, M>,
        mode: DeviceMode,
        reply: Option<Responder>,
    ) {
        if let Err(err) = svc.store.write_string(&self.config.mode_file, mode.as_str()) {
            tracing::warn!(%err, %mode, "cannot persist device mode");
        }

        svc.pipes.device_mode.set(ORIGIN, mode);
        if svc.pipes.has_submode(Submode::MODECHG) {
            svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::MODECHG));
        }
        tracing::info!(%mode, "device mode changed");
        svc.ui.emit(Signal::DeviceMode(mode));
        respond(reply, MethodReply::Ack(true));
    }
}
