use gpui::Context;
use tunebridge_bridge::{
    MessageFromController, content::ContentId, notification::NotificationMessage,
};

use crate::{binding::PlayerBinding, theme::Theme};

/// One visible player: its bridge binding plus the skin it is drawn in.
#[derive(Debug)]
pub struct PlayerEntity {
    pub binding: PlayerBinding,
    pub theme: Theme,
    /// Notifications not yet shown by the window.
    pub pending_notices: Vec<NotificationMessage>,
}

impl PlayerEntity {
    /// Wraps `binding` and re-renders whenever the session publishes a new
    /// playback snapshot or a lifecycle message.
    pub fn new(mut binding: PlayerBinding, theme: Theme, cx: &mut Context<Self>) -> Self {
        let mut state = binding.observe();
        cx.spawn(async move |this, cx| {
            while state.changed().await.is_ok() {
                if this.update(cx, |_, cx| cx.notify()).is_err() {
                    break;
                }
            }
        })
        .detach();

        // phase changes and notifications may arrive without a new snapshot
        if let Some(mut messages) = binding.take_messages() {
            cx.spawn(async move |this, cx| {
                while let Some(message) = messages.recv().await {
                    let updated = this.update(cx, |player, cx| {
                        player.handle_message(message);
                        cx.notify();
                    });
                    if updated.is_err() {
                        return;
                    }
                }
                let _ = this.update(cx, |player, cx| {
                    player.handle_message(MessageFromController::SessionClosed);
                    cx.notify();
                });
            })
            .detach();
        }

        Self {
            binding,
            theme,
            pending_notices: Vec::new(),
        }
    }

    fn handle_message(&mut self, message: MessageFromController) {
        if let Some(notice) = self.binding.handle_message(message) {
            self.pending_notices.push(notice);
        }
    }

    /// Asks the session for the selected content again after a failure.
    pub fn retry(&mut self) {
        match self.binding.reload() {
            Ok(true) => log::info!("{} player: retrying the selected content.", self.theme.name),
            Ok(false) => {}
            Err(e) => log::error!("{} player: {e:#}", self.theme.name),
        }
    }

    pub fn select(&mut self, id: ContentId) {
        if let Err(e) = self.binding.select(id) {
            log::error!("{} player: {e:#}", self.theme.name);
        }
    }

    pub fn toggle_playback(&mut self) {
        if let Err(e) = self.binding.toggle_playback() {
            log::error!("{} player: {e:#}", self.theme.name);
        }
    }
}
