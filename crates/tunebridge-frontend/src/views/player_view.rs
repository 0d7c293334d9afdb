use gpui::{
    Context, Entity, IntoElement, ParentElement, Render, SharedString, Styled, Window, div,
    prelude::FluentBuilder, rgb,
};
use gpui_component::{
    Disableable, StyledExt,
    button::{Button, ButtonVariants},
};

use crate::entities::player_entity::PlayerEntity;

/// Player card drawn in the entity's skin.
pub struct PlayerView {
    player: Entity<PlayerEntity>,
}

impl PlayerView {
    pub fn new(player: Entity<PlayerEntity>, cx: &mut Context<Self>) -> Self {
        cx.observe(&player, |_, _, cx| cx.notify()).detach();
        Self { player }
    }
}

impl Render for PlayerView {
    fn render(&mut self, _: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let player = self.player.read(cx);
        let theme = player.theme;
        let presentation = player.binding.present(&theme);
        let entity = self.player.clone();
        let retry_entity = self.player.clone();

        div()
            .w_72()
            .flex()
            .flex_col()
            .gap_2()
            .p_4()
            .rounded_xl()
            .bg(rgb(theme.background))
            .border_1()
            .border_color(rgb(theme.surface))
            .text_color(rgb(theme.text))
            .child(div().text_sm().font_semibold().child(theme.name))
            .child(
                div()
                    .text_xl()
                    .font_bold()
                    .text_color(rgb(theme.accent))
                    .child(presentation.status),
            )
            .child(div().text_xs().line_clamp(1).child(presentation.content))
            .child(div().text_lg().child(presentation.time))
            .child(
                Button::new(SharedString::from(format!("toggle-{}", theme.name)))
                    .primary()
                    .disabled(!presentation.controls_enabled)
                    .label(if presentation.is_playing { "Pause" } else { "Play" })
                    .on_click(move |_, _, cx| {
                        entity.update(cx, |player, _| player.toggle_playback());
                    }),
            )
            .when(presentation.can_retry, |this| {
                this.child(
                    Button::new(SharedString::from(format!("retry-{}", theme.name)))
                        .outline()
                        .label("Retry")
                        .on_click(move |_, _, cx| {
                            retry_entity.update(cx, |player, _| player.retry());
                        }),
                )
            })
            .when_some(presentation.error, |this, error| {
                this.child(div().text_sm().text_color(rgb(theme.error)).child(error))
            })
    }
}
