use super::event::{Action, ResolvedAction, ViewTarget};
use super::state::{ContextDelta, DialogueContext, View};
use crate::outputs::phrases;
use crate::portal::RenewalRequest;

/// Real-world effect held back until identity verification completes.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingEffect {
    PayViolations,
    RenewPassport(RenewalRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnEffect {
    /// Speak `speech` (may be empty) and show `ui_message`.
    Render { speech: String, ui_message: String },
    RequestVerification(PendingEffect),
    Log(String),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dispatch {
    pub deltas: Vec<ContextDelta>,
    pub effects: Vec<TurnEffect>,
}

impl Dispatch {
    fn render(&mut self, speech: impl Into<String>, ui_message: impl Into<String>) {
        self.effects.push(TurnEffect::Render {
            speech: speech.into(),
            ui_message: ui_message.into(),
        });
    }

    fn render_reply(&mut self, resolved: &ResolvedAction) {
        self.render(resolved.speech_response.clone(), resolved.ui_message.clone());
    }

    fn log(&mut self, msg: String) {
        self.effects.push(TurnEffect::Log(msg));
    }
}

pub struct Dispatcher;

impl Dispatcher {
    /// Pure Projection: (Context, ResolvedAction) -> (Deltas, Effects)
    /// Never touches history; the session records the turn.
    pub fn dispatch(&self, ctx: &DialogueContext, resolved: &ResolvedAction) -> Dispatch {
        let lang = ctx.language();
        let mut out = Dispatch::default();

        match &resolved.action {
            Action::Login => {
                if ctx.current_view() == View::Login {
                    out.deltas.push(ContextDelta::ViewChanged(View::Dashboard));
                    // The welcome replaces the provider reply; speak once.
                    out.render(phrases::welcome(lang), phrases::welcome(lang));
                } else {
                    out.log(format!("LOGIN ignored on {}", ctx.current_view()));
                    out.render_reply(resolved);
                }
            }
            Action::Navigate(ViewTarget::Known(target)) => {
                if let Some(delta) = navigation(ctx, *target) {
                    out.deltas.push(delta);
                } else {
                    out.log(format!("navigation to {target} blocked on {}", ctx.current_view()));
                }
                out.render_reply(resolved);
            }
            Action::Navigate(ViewTarget::Unrecognized(raw)) => {
                out.log(format!("navigation to unknown view {raw:?} ignored"));
                out.render_reply(resolved);
            }
            Action::FillForm => {
                if !resolved.form_data.is_empty() {
                    out.deltas
                        .push(ContextDelta::FormPatched(resolved.form_data.clone()));
                }
                // Auto-navigation alongside slot collection
                if let Some(delta) = resolved.target_view.and_then(|v| navigation(ctx, v)) {
                    out.deltas.push(delta);
                }
                out.render_reply(resolved);
            }
            Action::ConfirmAction => match ctx.current_view() {
                View::Violations => {
                    out.effects
                        .push(TurnEffect::RequestVerification(PendingEffect::PayViolations));
                    out.render_reply(resolved);
                }
                View::Passport => match renewal_from(ctx) {
                    Some(request) => {
                        out.effects.push(TurnEffect::RequestVerification(
                            PendingEffect::RenewPassport(request),
                        ));
                        out.render_reply(resolved);
                    }
                    None => {
                        let msg = phrases::renewal_missing_fields(lang);
                        out.render(msg, msg);
                    }
                },
                other => {
                    out.log(format!("nothing to confirm on {other}"));
                    out.render_reply(resolved);
                }
            },
            Action::GeneralQuery => out.render_reply(resolved),
            Action::Error => {
                out.render(phrases::apology(lang), phrases::apology_banner(lang));
            }
        }

        out
    }
}

/// Before login the only reachable view is LOGIN itself.
fn navigation(ctx: &DialogueContext, target: View) -> Option<ContextDelta> {
    if target == ctx.current_view() {
        return None;
    }
    if !ctx.is_authenticated() && target != View::Login {
        return None;
    }
    Some(ContextDelta::ViewChanged(target))
}

fn renewal_from(ctx: &DialogueContext) -> Option<RenewalRequest> {
    let city = ctx.field("city").filter(|c| !c.trim().is_empty())?;
    let duration = ctx.field("duration").filter(|d| !d.trim().is_empty())?;
    Some(RenewalRequest {
        city: city.to_string(),
        duration_years: duration.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in() -> DialogueContext {
        let mut ctx = DialogueContext::new();
        ctx.reduce(ContextDelta::ViewChanged(View::Dashboard));
        ctx
    }

    fn apply(ctx: &mut DialogueContext, resolved: &ResolvedAction) -> Vec<TurnEffect> {
        let dispatch = Dispatcher.dispatch(ctx, resolved);
        for delta in dispatch.deltas {
            ctx.reduce(delta);
        }
        dispatch.effects
    }

    #[test]
    fn login_from_login_view_speaks_welcome_only() {
        let mut ctx = DialogueContext::new();
        let effects = apply(
            &mut ctx,
            &ResolvedAction::new(Action::Login).with_speech("generic reply"),
        );
        assert_eq!(ctx.current_view(), View::Dashboard);
        let renders: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                TurnEffect::Render { speech, .. } => Some(speech.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(renders, vec![phrases::welcome(ctx.language())]);
    }

    #[test]
    fn login_elsewhere_is_a_noop() {
        let mut ctx = logged_in();
        ctx.reduce(ContextDelta::ViewChanged(View::Settings));
        apply(&mut ctx, &ResolvedAction::new(Action::Login));
        assert_eq!(ctx.current_view(), View::Settings);
    }

    #[test]
    fn navigation_is_blocked_before_login() {
        let mut ctx = DialogueContext::new();
        apply(
            &mut ctx,
            &ResolvedAction::new(Action::Navigate(ViewTarget::Known(View::Violations))),
        );
        assert_eq!(ctx.current_view(), View::Login);
    }

    #[test]
    fn unknown_navigation_leaves_view() {
        let mut ctx = logged_in();
        apply(
            &mut ctx,
            &ResolvedAction::new(Action::Navigate(ViewTarget::Unrecognized("GARAGE".into()))),
        );
        assert_eq!(ctx.current_view(), View::Dashboard);
    }

    #[test]
    fn fill_form_navigates_in_same_turn() {
        let mut ctx = logged_in();
        apply(
            &mut ctx,
            &ResolvedAction::new(Action::FillForm)
                .with_target(View::Passport)
                .with_field("city", "Riyadh"),
        );
        assert_eq!(ctx.current_view(), View::Passport);
        assert_eq!(ctx.field("city"), Some("Riyadh"));
    }

    #[test]
    fn confirm_on_violations_requests_payment_gate() {
        let mut ctx = logged_in();
        ctx.reduce(ContextDelta::ViewChanged(View::Violations));
        let effects = apply(&mut ctx, &ResolvedAction::new(Action::ConfirmAction));
        assert!(effects.contains(&TurnEffect::RequestVerification(PendingEffect::PayViolations)));
    }

    #[test]
    fn confirm_renewal_requires_city_and_duration() {
        let mut ctx = logged_in();
        ctx.reduce(ContextDelta::ViewChanged(View::Passport));
        ctx.reduce(ContextDelta::FieldCaptured {
            field: "city".into(),
            value: "Jeddah".into(),
        });
        let effects = apply(&mut ctx, &ResolvedAction::new(Action::ConfirmAction));
        assert!(!effects
            .iter()
            .any(|e| matches!(e, TurnEffect::RequestVerification(_))));

        ctx.reduce(ContextDelta::FieldCaptured {
            field: "duration".into(),
            value: "5".into(),
        });
        let effects = apply(&mut ctx, &ResolvedAction::new(Action::ConfirmAction));
        assert!(effects.contains(&TurnEffect::RequestVerification(
            PendingEffect::RenewPassport(RenewalRequest {
                city: "Jeddah".into(),
                duration_years: "5".into(),
            })
        )));
    }

    #[test]
    fn error_renders_fixed_apology_without_deltas() {
        let ctx = logged_in();
        let dispatch = Dispatcher.dispatch(&ctx, &ResolvedAction::error("x", "y"));
        assert!(dispatch.deltas.is_empty());
        assert_eq!(
            dispatch.effects,
            vec![TurnEffect::Render {
                speech: phrases::apology(ctx.language()).to_string(),
                ui_message: phrases::apology_banner(ctx.language()).to_string(),
            }]
        );
    }
}
