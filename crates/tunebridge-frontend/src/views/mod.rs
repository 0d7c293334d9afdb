mod player_view;

use gpui::{
    AppContext, Context, Entity, IntoElement, ParentElement, Render, SharedString, Styled, Window,
    div,
};
use gpui_component::{
    Root, StyledExt, WindowExt,
    button::{Button, ButtonVariants},
    notification::{Notification, NotificationType},
};
use tunebridge_bridge::notification;

use crate::{entities::DataEntities, views::player_view::PlayerView};

pub struct FrontendUi {
    data: DataEntities,
    selected: Option<usize>,
    player_views: Vec<Entity<PlayerView>>,
}

impl FrontendUi {
    pub fn new(data: &DataEntities, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let mut player_views = Vec::with_capacity(data.players.len());
        for player in &data.players {
            cx.observe_in(player, window, |_, player, window, cx| {
                let notices =
                    player.update(cx, |player, _| std::mem::take(&mut player.pending_notices));
                for notice in notices {
                    let notification_type = match notice.notification_type {
                        notification::NotificationType::Info => NotificationType::Info,
                        notification::NotificationType::Success => NotificationType::Success,
                        notification::NotificationType::Warning => NotificationType::Warning,
                        notification::NotificationType::Error => NotificationType::Error,
                    };
                    window.push_notification(
                        Notification::new()
                            .message(notice.message)
                            .with_type(notification_type),
                        cx,
                    );
                }
            })
            .detach();

            let player = player.clone();
            player_views.push(cx.new(|cx| PlayerView::new(player, cx)));
        }

        Self {
            data: data.clone(),
            // players start on the first catalog entry
            selected: (!data.catalog.is_empty()).then_some(0),
            player_views,
        }
    }

    /// Loads catalog entry `index` into every player.
    pub fn select(&mut self, index: usize, cx: &mut Context<Self>) {
        let Some(item) = self.data.catalog.get(index) else {
            return;
        };
        let id = item.content_id();
        log::info!("Selected {} by {} ({id})", item.title, item.artist);
        for player in &self.data.players {
            player.update(cx, |player, cx| {
                player.select(id.clone());
                cx.notify();
            });
        }
        self.selected = Some(index);
        cx.notify();
    }
}

impl Render for FrontendUi {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let notification_layer = Root::render_notification_layer(window, cx);
        let albums: Vec<_> = self
            .data
            .catalog
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let button = Button::new(SharedString::from(format!("album-{index}")))
                    .label(format!("{} · {}", item.title, item.artist))
                    .on_click(cx.listener(move |this, _, _, cx| this.select(index, cx)));
                if self.selected == Some(index) {
                    button.primary()
                } else {
                    button.outline()
                }
            })
            .collect();

        div()
            .size_full()
            .flex()
            .flex_col()
            .gap_4()
            .p_5()
            .child(div().child("tunebridge").text_2xl().font_bold())
            .child(div().flex().flex_wrap().gap_2().children(albums))
            .child(
                div()
                    .flex()
                    .flex_wrap()
                    .gap_4()
                    .children(self.player_views.iter().cloned()),
            )
            .children(notification_layer)
    }
}
