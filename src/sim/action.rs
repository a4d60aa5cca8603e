//! Timed action sequences
//!
//! A node runs at most one action tree at a time. Leaves either finish
//! instantly (texture swap, removal, cue) or consume time (wait, scale, fade).
//! Time left over when a leaf finishes flows into the next step, so a sequence
//! advanced by one big `dt` ends up in the same state as many small ones.

use super::transition::Transition;

/// Sprite textures the level swaps between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Texture {
    Background,
    Water,
    Prize,
    VineHolder,
    Vine,
    CrocMouthClosed,
    CrocMouthOpen,
}

/// Visual state an action can change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub texture: Texture,
    pub scale: f32,
    pub alpha: f32,
}

impl Appearance {
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            scale: 1.0,
            alpha: 1.0,
        }
    }
}

/// Signal emitted by a `Run` step for the level or director to act on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    /// Throw away the current level and present a fresh one
    PresentLevel(Transition),
}

/// One step (or composition of steps) in a node's timeline
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Wait(f32),
    SetTexture(Texture),
    ScaleTo { scale: f32, duration: f32 },
    FadeOut { duration: f32 },
    RemoveFromParent,
    Run(Cue),
    Sequence(Vec<Action>),
    RepeatForever(Box<Action>),
}

impl Action {
    pub fn sequence(steps: impl IntoIterator<Item = Action>) -> Self {
        Action::Sequence(steps.into_iter().collect())
    }

    pub fn repeat_forever(action: Action) -> Self {
        Action::RepeatForever(Box::new(action))
    }

    /// Total running time, `None` if it never ends
    pub fn duration(&self) -> Option<f32> {
        match self {
            Action::Wait(d) => Some(*d),
            Action::ScaleTo { duration, .. } | Action::FadeOut { duration } => Some(*duration),
            Action::SetTexture(_) | Action::RemoveFromParent | Action::Run(_) => Some(0.0),
            Action::Sequence(steps) => steps.iter().map(Action::duration).sum(),
            Action::RepeatForever(_) => None,
        }
    }
}

/// Side effects produced while advancing an action
#[derive(Debug, Default)]
pub struct ActionEffects {
    /// Node asked to be removed from the scene
    pub removed: bool,
    pub cues: Vec<Cue>,
    pub finished: bool,
}

/// Per-step bookkeeping, mirrors the shape of the action tree lazily
#[derive(Debug, Clone, Default)]
struct Progress {
    started: bool,
    elapsed: f32,
    from: f32,
    index: usize,
    child: Option<Box<Progress>>,
}

impl Progress {
    fn child(&mut self) -> &mut Progress {
        self.child.get_or_insert_with(Default::default)
    }
}

/// An action attached to a node, with its position in the timeline
#[derive(Debug, Clone)]
pub struct RunningAction {
    action: Action,
    progress: Progress,
    finished: bool,
}

impl RunningAction {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            progress: Progress::default(),
            finished: false,
        }
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance by `dt` seconds, applying visual changes to `look`
    pub fn update(&mut self, look: &mut Appearance, dt: f32) -> ActionEffects {
        let mut effects = ActionEffects::default();
        if self.finished {
            effects.finished = true;
            return effects;
        }
        if advance(&self.action, &mut self.progress, look, &mut effects, dt.max(0.0)).is_some()
            || effects.removed
        {
            self.finished = true;
        }
        effects.finished = self.finished;
        effects
    }
}

/// Returns the unused time if the action finished, `None` if still running
fn advance(
    action: &Action,
    progress: &mut Progress,
    look: &mut Appearance,
    effects: &mut ActionEffects,
    dt: f32,
) -> Option<f32> {
    match action {
        Action::Wait(duration) => tick_timer(progress, *duration, dt),
        Action::SetTexture(texture) => {
            look.texture = *texture;
            Some(dt)
        }
        Action::ScaleTo { scale, duration } => {
            if !progress.started {
                progress.from = look.scale;
            }
            let left = tick_timer(progress, *duration, dt);
            look.scale = lerp(progress.from, *scale, fraction(progress, *duration));
            left
        }
        Action::FadeOut { duration } => {
            if !progress.started {
                progress.from = look.alpha;
            }
            let left = tick_timer(progress, *duration, dt);
            look.alpha = lerp(progress.from, 0.0, fraction(progress, *duration));
            left
        }
        Action::RemoveFromParent => {
            effects.removed = true;
            Some(dt)
        }
        Action::Run(cue) => {
            effects.cues.push(*cue);
            Some(dt)
        }
        Action::Sequence(steps) => {
            let mut dt = dt;
            while progress.index < steps.len() {
                match advance(&steps[progress.index], progress.child(), look, effects, dt) {
                    Some(left) => {
                        progress.index += 1;
                        progress.child = None;
                        dt = left;
                        if effects.removed {
                            return Some(0.0);
                        }
                    }
                    None => return None,
                }
            }
            Some(dt)
        }
        Action::RepeatForever(body) => {
            let mut dt = dt;
            loop {
                match advance(body, progress.child(), look, effects, dt) {
                    Some(left) => {
                        progress.child = None;
                        // A pass that consumed no time would spin forever
                        if effects.removed || left >= dt {
                            return None;
                        }
                        dt = left;
                    }
                    None => return None,
                }
            }
        }
    }
}

fn tick_timer(progress: &mut Progress, duration: f32, dt: f32) -> Option<f32> {
    progress.started = true;
    progress.elapsed += dt;
    if progress.elapsed >= duration {
        Some(progress.elapsed - duration)
    } else {
        None
    }
}

fn fraction(progress: &Progress, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (progress.elapsed / duration).clamp(0.0, 1.0)
    }
}

#[inline]
fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn look() -> Appearance {
        Appearance::new(Texture::CrocMouthClosed)
    }

    #[test]
    fn test_sequence_runs_steps_in_order() {
        let mut look = look();
        let mut running = RunningAction::new(Action::sequence([
            Action::Wait(0.5),
            Action::SetTexture(Texture::CrocMouthOpen),
            Action::Wait(0.5),
            Action::SetTexture(Texture::CrocMouthClosed),
        ]));

        running.update(&mut look, 0.4);
        assert_eq!(look.texture, Texture::CrocMouthClosed);

        running.update(&mut look, 0.2);
        assert_eq!(look.texture, Texture::CrocMouthOpen);
        assert!(!running.is_finished());

        let fx = running.update(&mut look, 0.5);
        assert_eq!(look.texture, Texture::CrocMouthClosed);
        assert!(fx.finished);
    }

    #[test]
    fn test_leftover_time_carries_into_next_step() {
        let mut look = look();
        let mut running = RunningAction::new(Action::sequence([
            Action::Wait(0.1),
            Action::FadeOut { duration: 1.0 },
        ]));
        running.update(&mut look, 0.6);
        assert!((look.alpha - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_scale_interpolates_from_current_value() {
        let mut look = look();
        look.scale = 2.0;
        let mut running = RunningAction::new(Action::ScaleTo {
            scale: 0.0,
            duration: 0.08,
        });
        running.update(&mut look, 0.04);
        assert!((look.scale - 1.0).abs() < 1e-5);
        let fx = running.update(&mut look, 0.04);
        assert!(look.scale.abs() < 1e-5);
        assert!(fx.finished);
    }

    #[test]
    fn test_remove_stops_the_timeline() {
        let mut look = look();
        let mut running = RunningAction::new(Action::sequence([
            Action::FadeOut { duration: 0.25 },
            Action::RemoveFromParent,
            Action::SetTexture(Texture::CrocMouthOpen),
        ]));
        let fx = running.update(&mut look, 0.1);
        assert!(!fx.removed);

        let fx = running.update(&mut look, 0.2);
        assert!(fx.removed);
        assert!(fx.finished);
        assert_eq!(look.texture, Texture::CrocMouthClosed);
        assert_eq!(look.alpha, 0.0);
    }

    #[test]
    fn test_cue_fires_once() {
        let mut look = look();
        let cue = Cue::PresentLevel(Transition::fade(1.0));
        let mut running =
            RunningAction::new(Action::sequence([Action::Wait(1.0), Action::Run(cue)]));

        assert!(running.update(&mut look, 0.99).cues.is_empty());
        assert_eq!(running.update(&mut look, 0.02).cues, vec![cue]);
        assert!(running.update(&mut look, 5.0).cues.is_empty());
    }

    #[test]
    fn test_repeat_forever_loops() {
        let mut look = look();
        let mut running = RunningAction::new(Action::repeat_forever(Action::sequence([
            Action::Wait(1.0),
            Action::SetTexture(Texture::CrocMouthOpen),
            Action::Wait(1.0),
            Action::SetTexture(Texture::CrocMouthClosed),
        ])));

        running.update(&mut look, 1.5);
        assert_eq!(look.texture, Texture::CrocMouthOpen);
        running.update(&mut look, 1.0);
        assert_eq!(look.texture, Texture::CrocMouthClosed);
        running.update(&mut look, 1.0);
        assert_eq!(look.texture, Texture::CrocMouthOpen);
        assert!(!running.is_finished());
    }

    #[test]
    fn test_repeat_forever_of_instant_body_terminates_each_update() {
        let mut look = look();
        let mut running =
            RunningAction::new(Action::repeat_forever(Action::SetTexture(Texture::Vine)));
        running.update(&mut look, 1.0);
        assert_eq!(look.texture, Texture::Vine);
        assert!(!running.is_finished());
    }

    #[test]
    fn test_duration() {
        let action = Action::sequence([
            Action::Wait(0.25),
            Action::FadeOut { duration: 0.25 },
            Action::RemoveFromParent,
        ]);
        assert_eq!(action.duration(), Some(0.5));
        assert_eq!(Action::repeat_forever(Action::Wait(1.0)).duration(), None);
    }
}
