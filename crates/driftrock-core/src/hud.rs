//! Label model for the on-screen display.
//!
//! The GUI collaborator lays out and draws these labels; this module only
//! decides their text and visibility.

use std::fmt;

use drift::{ListenerError, WorldContext};
use serde::{Deserialize, Serialize};

use crate::phase::{GamePhase, PhaseListener};
use crate::player::PlayerListener;
use crate::score::ScoreListener;

/// A line of text with a visibility flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Text to draw.
    pub text: String,
    /// Whether to draw it.
    pub visible: bool,
}

impl Label {
    fn new(text: impl Into<String>, visible: bool) -> Self {
        Self {
            text: text.into(),
            visible,
        }
    }
}

/// Which label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HudLabel {
    /// Game title.
    Title,
    /// Current score.
    Score,
    /// Lives left.
    Lives,
    /// Current level.
    Level,
    /// Best score so far.
    HighScore,
    /// "Press enter" prompt.
    StartPrompt,
    /// Demo banner.
    Demo,
    /// Game-over banner.
    GameOver,
}

impl HudLabel {
    /// Every label, in drawing order.
    pub const ALL: [Self; 8] = [
        Self::Title,
        Self::Score,
        Self::Lives,
        Self::Level,
        Self::HighScore,
        Self::StartPrompt,
        Self::Demo,
        Self::GameOver,
    ];
}

impl fmt::Display for HudLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "Title"),
            Self::Score => write!(f, "Score"),
            Self::Lives => write!(f, "Lives"),
            Self::Level => write!(f, "Level"),
            Self::HighScore => write!(f, "HighScore"),
            Self::StartPrompt => write!(f, "StartPrompt"),
            Self::Demo => write!(f, "Demo"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}

/// Every label of the display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    title: Label,
    score: Label,
    lives: Label,
    level: Label,
    high_score: Label,
    start_prompt: Label,
    demo: Label,
    game_over: Label,
}

impl Hud {
    /// The attract-mode display.
    #[must_use]
    pub fn new(lives: u32, high_score: u64) -> Self {
        Self {
            title: Label::new("ASTEROIDS", true),
            score: Label::new("Score: 0", false),
            lives: Label::new(format!("Lives: {lives}"), false),
            level: Label::new("Level: 0", false),
            high_score: Label::new(format!("High Score: {high_score}"), false),
            start_prompt: Label::new("PRESS ENTER TO START", true),
            demo: Label::new("DEMO MODE", true),
            game_over: Label::new("GAME OVER", false),
        }
    }

    /// Back to the attract-mode display.
    pub fn reset(&mut self, lives: u32, high_score: u64) {
        *self = Self::new(lives, high_score);
    }

    /// Looks up a label.
    #[must_use]
    pub const fn label(&self, which: HudLabel) -> &Label {
        match which {
            HudLabel::Title => &self.title,
            HudLabel::Score => &self.score,
            HudLabel::Lives => &self.lives,
            HudLabel::Level => &self.level,
            HudLabel::HighScore => &self.high_score,
            HudLabel::StartPrompt => &self.start_prompt,
            HudLabel::Demo => &self.demo,
            HudLabel::GameOver => &self.game_over,
        }
    }

    /// Visible labels in drawing order.
    pub fn visible(&self) -> impl Iterator<Item = (HudLabel, &Label)> + '_ {
        HudLabel::ALL
            .into_iter()
            .map(|which| (which, self.label(which)))
            .filter(|(_, label)| label.visible)
    }

    /// Shows a new best score.
    pub fn set_high_score(&mut self, high_score: u64) {
        self.high_score.text = format!("High Score: {high_score}");
    }
}

impl ScoreListener for Hud {
    fn on_score_changed(&mut self, score: u64) -> Result<(), ListenerError> {
        self.score.text = format!("Score: {score}");
        Ok(())
    }
}

impl PlayerListener for Hud {
    fn on_player_killed(
        &mut self,
        _ctx: &mut WorldContext<'_>,
        lives_left: u32,
    ) -> Result<(), ListenerError> {
        self.lives.text = format!("Lives: {lives_left}");
        Ok(())
    }
}

impl PhaseListener for Hud {
    fn on_phase_changed(&mut self, phase: GamePhase) -> Result<(), ListenerError> {
        let attract = phase == GamePhase::AttractMode;
        self.start_prompt.visible = attract;
        self.demo.visible = attract;
        self.score.visible = !attract;
        self.lives.visible = !attract;
        self.level.visible = !attract;
        self.high_score.visible = !attract;
        self.game_over.visible = phase == GamePhase::GameOver;
        Ok(())
    }

    fn on_level_changed(&mut self, level: u32) -> Result<(), ListenerError> {
        self.level.text = format!("Level: {level}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible_names(hud: &Hud) -> Vec<String> {
        hud.visible().map(|(which, _)| which.to_string()).collect()
    }

    #[test]
    fn attract_display() {
        let hud = Hud::new(3, 120);
        assert_eq!(visible_names(&hud), vec!["Title", "StartPrompt", "Demo"]);
        assert_eq!(hud.label(HudLabel::HighScore).text, "High Score: 120");
        assert_eq!(hud.label(HudLabel::Lives).text, "Lives: 3");
    }

    #[test]
    fn active_display() {
        let mut hud = Hud::new(3, 0);
        hud.on_phase_changed(GamePhase::Active).unwrap();
        assert_eq!(
            visible_names(&hud),
            vec!["Title", "Score", "Lives", "Level", "HighScore"]
        );
    }

    #[test]
    fn game_over_banner_only_in_game_over() {
        let mut hud = Hud::new(3, 0);
        hud.on_phase_changed(GamePhase::GameOver).unwrap();
        assert!(hud.label(HudLabel::GameOver).visible);
        hud.on_phase_changed(GamePhase::AttractMode).unwrap();
        assert!(!hud.label(HudLabel::GameOver).visible);
        assert!(hud.label(HudLabel::StartPrompt).visible);
    }

    #[test]
    fn texts_follow_events() {
        let mut hud = Hud::new(3, 0);
        hud.on_score_changed(40).unwrap();
        hud.on_level_changed(2).unwrap();
        hud.set_high_score(90);
        assert_eq!(hud.label(HudLabel::Score).text, "Score: 40");
        assert_eq!(hud.label(HudLabel::Level).text, "Level: 2");
        assert_eq!(hud.label(HudLabel::HighScore).text, "High Score: 90");
    }

    #[test]
    fn reset_restores_attract_display() {
        let mut hud = Hud::new(3, 0);
        hud.on_phase_changed(GamePhase::Active).unwrap();
        hud.on_score_changed(70).unwrap();
        hud.reset(3, 70);
        assert_eq!(hud, Hud::new(3, 70));
    }
}
