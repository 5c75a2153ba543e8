use super::*;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingStage {
    applied: Mutex<Vec<(TransitionEdge, &'static str)>>,
}

impl Stage for RecordingStage {
    fn apply(&self, edge: TransitionEdge, phase: &Phase) {
        self.applied
            .lock()
            .expect("stage lock")
            .push((edge, phase.label));
    }
}

fn assert_elapsed(started: tokio::time::Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + ms(5),
        "elapsed {elapsed:?}, expected {expected:?}"
    );
}

#[test]
fn audience_graph_satisfies_the_hub_invariant() {
    let graph = audience_graph(Arc::new(TracingStage), 0.0).expect("authored graph is valid");
    assert_eq!(graph.hub(), Screen::Blank);
    assert_eq!(graph.len(), authored_choreographies().len());

    for from in Screen::ALL {
        for to in Screen::ALL.into_iter().filter(|to| *to != from) {
            let route = graph.resolve(from, to).expect("route");
            assert!((1..=2).contains(&route.len()), "{from}->{to}");
        }
    }
}

#[test]
fn authored_edges_are_not_symmetric() {
    let graph = audience_graph(Arc::new(TracingStage), 0.0).expect("graph");
    assert!(graph.contains(Screen::Intro, Screen::Timeout));
    assert!(!graph.contains(Screen::Timeout, Screen::Match));
    assert!(graph.contains(Screen::Timeout, Screen::Intro));
    assert!(!graph.contains(Screen::Match, Screen::Timeout));
    assert_eq!(
        graph
            .resolve(Screen::Match, Screen::Sponsor)
            .expect("route")
            .edges()
            .collect::<Vec<_>>(),
        vec![
            TransitionEdge::new(Screen::Match, Screen::Blank),
            TransitionEdge::new(Screen::Blank, Screen::Sponsor),
        ]
    );
}

#[test]
fn composite_edges_chain_through_the_logo() {
    let bracket = authored_choreographies()
        .into_iter()
        .find(|(from, to, _)| (*from, *to) == (Screen::Blank, Screen::Bracket))
        .map(|(_, _, choreography)| choreography)
        .expect("blank->bracket authored");

    assert_eq!(
        bracket.total_duration(),
        blank_to_logo().total_duration() + ms(50) + logo_to_bracket().total_duration()
    );
    assert_eq!(
        bracket.phases().map(|phase| phase.label).collect::<Vec<_>>(),
        vec!["close blinds", "flip to logo", "shrink logo and show bracket"]
    );
}

#[tokio::test(start_paused = true)]
async fn staged_choreography_plays_phases_in_order_and_takes_its_duration() {
    let stage = Arc::new(RecordingStage::default());
    let choreography = sponsor_to_blank();
    let expected = choreography.total_duration();
    let staged = Staged::new(choreography, stage.clone(), 1.0);
    let edge = TransitionEdge::new(Screen::Sponsor, Screen::Blank);

    let started = tokio::time::Instant::now();
    staged.run(edge).await;

    assert_elapsed(started, expected);
    assert_eq!(
        *stage.applied.lock().expect("stage lock"),
        vec![(edge, "fade sponsor"), (edge, "open blinds")]
    );
}

#[tokio::test(start_paused = true)]
async fn time_scale_shortens_every_step() {
    let stage = Arc::new(RecordingStage::default());
    let staged = Staged::new(blank_to_logo(), stage, 0.5);

    let started = tokio::time::Instant::now();
    staged
        .run(TransitionEdge::new(Screen::Blank, Screen::Logo))
        .await;

    assert_elapsed(started, ms(850));
}

#[test]
fn non_positive_scale_collapses_to_zero() {
    assert_eq!(scaled(ms(500), 0.0), Duration::ZERO);
    assert_eq!(scaled(ms(500), -1.0), Duration::ZERO);
    assert_eq!(scaled(ms(500), f64::NAN), Duration::ZERO);
    assert_eq!(scaled(ms(500), 2.0), ms(1000));
}

#[test]
fn oversized_scale_is_clamped_and_never_overflows() {
    assert_eq!(scaled(ms(500), 1e300), ms(500) * MAX_TIME_SCALE as u32);
    assert_eq!(scaled(ms(500), MAX_TIME_SCALE * 2.0), scaled(ms(500), MAX_TIME_SCALE));
    assert_eq!(scaled(Duration::MAX, 2.0), Duration::MAX);
}

#[tokio::test(start_paused = true)]
async fn huge_time_scale_still_finishes_the_animation() {
    let stage = Arc::new(RecordingStage::default());
    let staged = Staged::new(blank_to_logo(), stage.clone(), 1e300);

    let started = tokio::time::Instant::now();
    staged
        .run(TransitionEdge::new(Screen::Blank, Screen::Logo))
        .await;

    assert_elapsed(started, blank_to_logo().total_duration() * MAX_TIME_SCALE as u32);
    assert!(!stage.applied.lock().expect("stage lock").is_empty());
}
