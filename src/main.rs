#[actix_web::main]
async fn main() {
    if let Err(err) = scenariogen_lib::run().await {
        eprintln!("scenariogen: {}", err);
        std::process::exit(1);
    }
}
