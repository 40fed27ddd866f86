#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let api_key = std::env::var("GOOGLE_MAPS_API_KEY").unwrap_or_default();

    // Space Needle's Address
    let mut config = nririsk::Config::new(api_key);
    config.address = nririsk::Address {
        street: "Broad St".into(),
        number: 400,
        city: "Seattle".into(),
        state: "Washington".into(),
        country: "United States".into(),
    };
    println!("{:#?}", nririsk::report(&config).await);
}
