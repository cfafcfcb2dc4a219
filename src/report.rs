/// posts a solved run's score to a scoreboard endpoint: `filename`, `moves`,
/// `score`, `bot_name`, `final_status`, per §6's external-interface contract.
/// Best-effort: network failures are logged and swallowed, never propagated,
/// so a flaky or absent scoreboard never takes down a solve.
#[cfg(feature = "ureq")]
pub fn post_score(url: &str, filename: &str, bot_name: &str, moves: u32, score: i64, final_status: &str) {
    let moves = moves.to_string();
    let score = score.to_string();
    let fields = [
        ("filename", filename),
        ("moves", moves.as_str()),
        ("score", score.as_str()),
        ("bot_name", bot_name),
        ("final_status", final_status),
    ];
    match ureq::post(url).send_form(&fields) {
        Ok(response) => log::debug!("score report accepted: {}", response.status()),
        Err(err) => log::warn!("score report failed, continuing anyway: {err}"),
    }
}
