//! The authored animations of the audience display, expressed as timed
//! phases played against a [`Stage`].

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::domain::Screen;
use tracing::debug;

use crate::graph::{GraphError, TransitionEdge, TransitionGraph, TransitionOperation};

/// One sequential step of an animation. Effects that run in parallel within
/// a step are folded into the step's duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub label: &'static str,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Phase(Phase),
    Pause(Duration),
}

/// The presentation surface a choreography is played against.
pub trait Stage: Send + Sync {
    fn apply(&self, edge: TransitionEdge, phase: &Phase);
}

/// Stage that only reports phases to the log.
pub struct TracingStage;

impl Stage for TracingStage {
    fn apply(&self, edge: TransitionEdge, phase: &Phase) {
        debug!(
            edge = %edge,
            phase = phase.label,
            duration_ms = phase.duration.as_millis() as u64,
            "transition phase"
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choreography {
    steps: Vec<Step>,
}

impl Choreography {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(mut self, label: &'static str, duration: Duration) -> Self {
        self.steps.push(Step::Phase(Phase { label, duration }));
        self
    }

    pub fn pause(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Pause(duration));
        self
    }

    pub fn then(mut self, other: Choreography) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn phases(&self) -> impl Iterator<Item = &Phase> + '_ {
        self.steps.iter().filter_map(|step| match step {
            Step::Phase(phase) => Some(phase),
            Step::Pause(_) => None,
        })
    }

    pub fn total_duration(&self) -> Duration {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Phase(phase) => phase.duration,
                Step::Pause(duration) => *duration,
            })
            .sum()
    }

    pub async fn perform(&self, edge: TransitionEdge, stage: &dyn Stage, time_scale: f64) {
        for step in &self.steps {
            match step {
                Step::Phase(phase) => {
                    stage.apply(edge, phase);
                    tokio::time::sleep(scaled(phase.duration, time_scale)).await;
                }
                Step::Pause(duration) => tokio::time::sleep(scaled(*duration, time_scale)).await,
            }
        }
    }
}

/// Largest accepted `time_scale`; larger values are clamped to it.
pub const MAX_TIME_SCALE: f64 = 100.0;

fn scaled(duration: Duration, time_scale: f64) -> Duration {
    if !(time_scale.is_finite() && time_scale > 0.0) {
        return Duration::ZERO;
    }
    let scale = time_scale.min(MAX_TIME_SCALE);
    Duration::try_from_secs_f64(duration.as_secs_f64() * scale).unwrap_or(Duration::MAX)
}

/// A choreography bound to the stage it plays on.
pub struct Staged {
    choreography: Choreography,
    stage: Arc<dyn Stage>,
    time_scale: f64,
}

impl Staged {
    pub fn new(choreography: Choreography, stage: Arc<dyn Stage>, time_scale: f64) -> Self {
        Self {
            choreography,
            stage,
            time_scale,
        }
    }
}

#[async_trait]
impl TransitionOperation for Staged {
    async fn run(&self, edge: TransitionEdge) {
        self.choreography
            .perform(edge, self.stage.as_ref(), self.time_scale)
            .await;
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn alliance_selection_to_blank() -> Choreography {
    Choreography::new().phase("slide out alliance selection", ms(500))
}

fn blank_to_alliance_selection() -> Choreography {
    Choreography::new().phase("slide in alliance selection", ms(500))
}

fn blank_to_intro() -> Choreography {
    Choreography::new()
        .phase("show overlay", ms(500))
        .phase("widen scores to intro", ms(500))
        .phase("drop match info", ms(500))
}

fn blank_to_logo() -> Choreography {
    Choreography::new()
        .phase("close blinds", ms(1000))
        .pause(ms(200))
        .phase("flip to logo", ms(500))
}

fn blank_to_logo_luma() -> Choreography {
    Choreography::new().phase("flip to logo", ms(1000))
}

fn blank_to_match() -> Choreography {
    Choreography::new()
        .phase("show overlay", ms(500))
        .phase("extend scores", ms(500))
        .phase("drop match info", ms(500))
}

fn blank_to_sponsor() -> Choreography {
    Choreography::new()
        .phase("close blinds", ms(1000))
        .pause(ms(200))
        .phase("fade in sponsor", ms(1000))
}

fn blank_to_timeout() -> Choreography {
    Choreography::new()
        .phase("show overlay", ms(500))
        .phase("raise logo", ms(500))
        .phase("show timer", ms(750))
}

fn bracket_to_logo() -> Choreography {
    Choreography::new().phase("fade bracket and center logo", ms(625))
}

fn bracket_to_score() -> Choreography {
    Choreography::new()
        .phase("fade bracket", ms(1000))
        .phase("fade in final score", ms(1000))
}

fn intro_to_blank() -> Choreography {
    Choreography::new()
        .phase("raise match info", ms(500))
        .phase("narrow scores", ms(500))
        .phase("hide overlay", ms(1000))
}

fn intro_to_match() -> Choreography {
    Choreography::new()
        .phase("extend scores", ms(500))
        .phase("show score numbers", ms(750))
}

fn intro_to_timeout() -> Choreography {
    Choreography::new()
        .phase("raise match info", ms(500))
        .phase("narrow scores", ms(500))
        .phase("raise logo", ms(500))
        .phase("show timer", ms(750))
}

fn logo_to_blank() -> Choreography {
    Choreography::new()
        .phase("flip logo away", ms(500))
        .pause(ms(200))
        .phase("open blinds", ms(1000))
}

fn logo_to_bracket() -> Choreography {
    Choreography::new().phase("shrink logo and show bracket", ms(1000))
}

fn logo_to_logo_luma() -> Choreography {
    Choreography::new().phase("open blinds", ms(1000))
}

fn logo_to_score() -> Choreography {
    Choreography::new().phase("raise logo and show final score", ms(1000))
}

fn logo_to_sponsor() -> Choreography {
    Choreography::new()
        .phase("turn logo", ms(750))
        .phase("fade in sponsor", ms(1000))
}

fn logo_luma_to_blank() -> Choreography {
    Choreography::new().phase("flip logo away", ms(1000))
}

fn logo_luma_to_logo() -> Choreography {
    Choreography::new().phase("close blinds", ms(1000))
}

fn match_to_blank() -> Choreography {
    Choreography::new()
        .phase("fade score numbers", ms(300))
        .phase("collapse scores", ms(500))
        .phase("hide overlay", ms(1000))
}

fn match_to_intro() -> Choreography {
    Choreography::new()
        .phase("fade score numbers", ms(300))
        .phase("narrow scores to intro", ms(500))
        .phase("show avatars", ms(500))
}

fn score_to_bracket() -> Choreography {
    Choreography::new()
        .phase("fade final score", ms(1000))
        .phase("show bracket", ms(1000))
}

fn score_to_logo() -> Choreography {
    Choreography::new().phase("fade final score and center logo", ms(625))
}

fn sponsor_to_blank() -> Choreography {
    Choreography::new()
        .phase("fade sponsor", ms(1000))
        .pause(ms(200))
        .phase("open blinds", ms(1000))
}

fn sponsor_to_logo() -> Choreography {
    Choreography::new()
        .phase("fade sponsor", ms(1000))
        .phase("turn logo", ms(750))
}

fn timeout_to_blank() -> Choreography {
    Choreography::new()
        .phase("hide timer", ms(300))
        .phase("lower logo", ms(500))
        .phase("hide overlay", ms(1000))
}

fn timeout_to_intro() -> Choreography {
    Choreography::new()
        .phase("hide timer", ms(300))
        .phase("lower logo", ms(500))
        .phase("widen scores to intro", ms(500))
        .phase("drop match info", ms(500))
}

/// Every authored edge of the audience display. Screens that share the logo
/// backdrop reach each other by chaining through the logo animations.
pub fn authored_choreographies() -> Vec<(Screen, Screen, Choreography)> {
    use Screen::*;

    vec![
        (AllianceSelection, Blank, alliance_selection_to_blank()),
        (Blank, AllianceSelection, blank_to_alliance_selection()),
        (
            Blank,
            Bracket,
            blank_to_logo().pause(ms(50)).then(logo_to_bracket()),
        ),
        (Blank, Intro, blank_to_intro()),
        (Blank, Logo, blank_to_logo()),
        (Blank, LogoLuma, blank_to_logo_luma()),
        (Blank, Match, blank_to_match()),
        (
            Blank,
            Score,
            blank_to_logo().pause(ms(50)).then(logo_to_score()),
        ),
        (Blank, Sponsor, blank_to_sponsor()),
        (Blank, Timeout, blank_to_timeout()),
        (Bracket, Blank, bracket_to_logo().then(logo_to_blank())),
        (Bracket, Logo, bracket_to_logo()),
        (Bracket, LogoLuma, bracket_to_logo().then(logo_to_logo_luma())),
        (Bracket, Score, bracket_to_score()),
        (Bracket, Sponsor, bracket_to_logo().then(logo_to_sponsor())),
        (Intro, Blank, intro_to_blank()),
        (Intro, Match, intro_to_match()),
        (Intro, Timeout, intro_to_timeout()),
        (Logo, Blank, logo_to_blank()),
        (Logo, Bracket, logo_to_bracket()),
        (Logo, LogoLuma, logo_to_logo_luma()),
        (Logo, Score, logo_to_score()),
        (Logo, Sponsor, logo_to_sponsor()),
        (LogoLuma, Blank, logo_luma_to_blank()),
        (LogoLuma, Bracket, logo_luma_to_logo().then(logo_to_bracket())),
        (LogoLuma, Logo, logo_luma_to_logo()),
        (LogoLuma, Score, logo_luma_to_logo().then(logo_to_score())),
        (Match, Blank, match_to_blank()),
        (Match, Intro, match_to_intro()),
        (Score, Blank, score_to_logo().then(logo_to_blank())),
        (Score, Bracket, score_to_bracket()),
        (Score, Logo, score_to_logo()),
        (Score, LogoLuma, score_to_logo().then(logo_to_logo_luma())),
        (Score, Sponsor, score_to_logo().then(logo_to_sponsor())),
        (Sponsor, Blank, sponsor_to_blank()),
        (Sponsor, Bracket, sponsor_to_logo().then(logo_to_bracket())),
        (Sponsor, Logo, sponsor_to_logo()),
        (Sponsor, Score, sponsor_to_logo().then(logo_to_score())),
        (Timeout, Blank, timeout_to_blank()),
        (Timeout, Intro, timeout_to_intro()),
    ]
}

/// Builds the validated audience display graph, hubbed on [`Screen::HUB`].
pub fn audience_graph(
    stage: Arc<dyn Stage>,
    time_scale: f64,
) -> Result<TransitionGraph, GraphError> {
    authored_choreographies()
        .into_iter()
        .fold(
            TransitionGraph::builder(Screen::HUB),
            |builder, (from, to, choreography)| {
                builder.edge(
                    from,
                    to,
                    Staged::new(choreography, Arc::clone(&stage), time_scale),
                )
            },
        )
        .build()
}

#[cfg(test)]
#[path = "tests/choreography_tests.rs"]
mod tests;
