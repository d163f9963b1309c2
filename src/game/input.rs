//! Concrete intent sources: idle, manually driven, and scripted sequences.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::collaborators::{InputSource, Intent};

/// Never asks for anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleInput;

impl InputSource for IdleInput {
    fn sample(&mut self, _dt: f32) -> Intent {
        Intent::idle()
    }
}

/// Intent set from outside, e.g. by a player input adapter or a test.
/// Clones share the same intent.
#[derive(Debug, Clone, Default)]
pub struct ManualInput {
    intent: Rc<Cell<Intent>>,
}

impl ManualInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, intent: Intent) {
        self.intent.set(intent);
    }

    pub fn get(&self) -> Intent {
        self.intent.get()
    }
}

impl InputSource for ManualInput {
    fn sample(&mut self, _dt: f32) -> Intent {
        self.intent.get()
    }
}

#[derive(Debug, Clone, Copy)]
struct ScriptStep {
    intent: Intent,
    remaining: f32,
}

/// Plays a queue of intents, each held for a number of seconds, then idles.
/// Used for automated and cutscene movement.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    steps: VecDeque<ScriptStep>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, intent: Intent, seconds: f32) -> Self {
        self.push(intent, seconds);
        self
    }

    pub fn push(&mut self, intent: Intent, seconds: f32) {
        if seconds > 0.0 {
            self.steps.push_back(ScriptStep {
                intent,
                remaining: seconds,
            });
        }
    }

    pub fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn remaining_time(&self) -> f32 {
        self.steps.iter().map(|s| s.remaining).sum()
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self, dt: f32) -> Intent {
        let Some(step) = self.steps.front_mut() else {
            return Intent::idle();
        };
        let intent = step.intent;
        step.remaining -= dt.max(0.0);
        if step.remaining <= 0.0 {
            self.steps.pop_front();
        }
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_plays_steps_in_order() {
        let mut input = ScriptedInput::new()
            .then(Intent::moving(0.0, 1.0), 0.5)
            .then(Intent::idle().with_jump(), 0.25);
        assert_eq!(input.remaining_time(), 0.75);

        assert_eq!(input.sample(0.25), Intent::moving(0.0, 1.0));
        assert_eq!(input.sample(0.25), Intent::moving(0.0, 1.0));
        assert!(input.sample(0.25).jump_requested);
        assert!(input.is_finished());
        assert_eq!(input.sample(0.25), Intent::idle());
    }

    #[test]
    fn test_zero_length_steps_are_skipped() {
        let input = ScriptedInput::new().then(Intent::moving(1.0, 0.0), 0.0);
        assert!(input.is_finished());
    }

    #[test]
    fn test_manual_input_clones_share_intent() {
        let input = ManualInput::new();
        let mut sampled = input.clone();
        input.set(Intent::moving(1.0, 0.0).with_sprint());
        assert!(sampled.sample(0.016).sprint_requested);
    }
}
