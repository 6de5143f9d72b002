use pomoloop_core::Insight;

use super::{CliResult, Session};

pub fn run(json: bool) -> CliResult {
    let session = Session::open()?;
    let insight = Insight::of(&session.app);
    if json {
        println!("{}", serde_json::to_string_pretty(&insight)?);
    } else {
        println!("{insight}");
    }
    Ok(())
}
