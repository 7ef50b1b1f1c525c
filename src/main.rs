use deathstar::error::AppResult;

fn main() -> AppResult<()> {
    deathstar::entry::run()
}
