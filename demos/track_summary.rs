use trackburn::Track;

fn main() -> anyhow::Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        anyhow::bail!("usage: track_summary <track.kml>");
    };

    let raw = std::fs::read(&path)?;
    let track = Track::parse(&raw)?;

    println!("{}: {} points", path, track.len());
    let b = track.bounding_box();
    println!(
        "bounds: lat {:.5}..{:.5}  lon {:.5}..{:.5}",
        b.min_lat, b.max_lat, b.min_lon, b.max_lon
    );

    match (track.start_ms(), track.end_ms()) {
        (Some(start), Some(end)) => {
            let span_s = (end - start) as f64 / 1000.0;
            println!("span: {span_s:.1} s");
            for i in 0..=10 {
                let at = start + (end - start) * i / 10;
                match track.speed_at(at) {
                    Some(kmh) => println!("  t+{:6.1}s  {kmh:6.1} km/h", (at - start) as f64 / 1000.0),
                    None => println!("  t+{:6.1}s  --", (at - start) as f64 / 1000.0),
                }
            }
        }
        _ => println!("track carries no timestamps"),
    }
    Ok(())
}
