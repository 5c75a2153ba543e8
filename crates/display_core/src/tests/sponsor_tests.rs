use super::*;
use axum::{http::StatusCode, routing::get, Json, Router};
use tokio::net::TcpListener;

fn slide(id: i64, line1: &str, image: &str, display_time_sec: u32) -> SponsorSlide {
    SponsorSlide {
        id,
        subtitle: "Thank you to our sponsors".into(),
        line1: line1.into(),
        line2: String::new(),
        image: image.into(),
        display_time_sec,
    }
}

async fn spawn_slide_server(slides: Option<Vec<SponsorSlide>>) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = match slides {
        Some(slides) => Router::new().route(
            "/api/sponsor_slides",
            get(move || {
                let slides = slides.clone();
                async move { Json(slides) }
            }),
        ),
        None => Router::new().route(
            "/api/sponsor_slides",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ),
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

#[test]
fn deck_marks_the_first_slide_and_converts_display_time() {
    let deck = SponsorDeck::from_slides(vec![
        slide(1, "Acme Robotics", "", 10),
        slide(2, "", "acme.png", 5),
    ]);

    assert_eq!(deck.len(), 2);
    assert!(deck.cards[0].first);
    assert!(!deck.cards[1].first);
    assert_eq!(deck.cards[0].display_time, Duration::from_secs(10));
    assert!(deck.cards[1].slide.is_image());
}

#[tokio::test]
async fn loading_the_sponsor_screen_publishes_a_fresh_deck() -> Result<()> {
    let server_url = spawn_slide_server(Some(vec![
        slide(1, "Acme Robotics", "", 10),
        slide(2, "Widget Co", "", 8),
    ]))
    .await?;
    let loader = HttpSponsorLoader::new(format!("{server_url}/"));
    let mut deck = loader.subscribe();
    assert!(deck.borrow().is_empty());

    loader.load(Screen::Sponsor).await?;

    assert!(deck.has_changed()?);
    let published = deck.borrow_and_update().clone();
    assert_eq!(published.len(), 2);
    assert_eq!(published.cards[1].slide.line1, "Widget Co");
    Ok(())
}

#[tokio::test]
async fn other_screens_do_not_fetch_anything() -> Result<()> {
    // Nothing listens here; a fetch would fail.
    let loader = HttpSponsorLoader::new("http://127.0.0.1:9");
    loader.load(Screen::Score).await?;
    assert!(loader.subscribe().borrow().is_empty());
    Ok(())
}

#[tokio::test]
async fn server_errors_are_reported_and_keep_the_previous_deck() -> Result<()> {
    let server_url = spawn_slide_server(None).await?;
    let loader = HttpSponsorLoader::new(server_url);

    let err = loader
        .load(Screen::Sponsor)
        .await
        .expect_err("500 from the slide endpoint");
    assert!(err.to_string().contains("500"), "{err}");
    assert!(loader.subscribe().borrow().is_empty());
    Ok(())
}
