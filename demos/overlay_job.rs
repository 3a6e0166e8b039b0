use trackburn::{JobEvent, JobScheduler, JobSpec, JobState, SchedulerConfig, TrackSource};

// A one-minute ride along the Seine, sampled every ten seconds.
const DEMO_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">
  <Document><Placemark>
    <gx:Track>
      <when>2024-05-04T09:00:00Z</when>
      <when>2024-05-04T09:00:10Z</when>
      <when>2024-05-04T09:00:20Z</when>
      <when>2024-05-04T09:00:30Z</when>
      <when>2024-05-04T09:00:40Z</when>
      <when>2024-05-04T09:00:50Z</when>
      <when>2024-05-04T09:01:00Z</when>
      <gx:coord>2.2945 48.8584 35.0</gx:coord>
      <gx:coord>2.2957 48.8589 35.5</gx:coord>
      <gx:coord>2.2971 48.8596 36.0</gx:coord>
      <gx:coord>2.2988 48.8601 36.0</gx:coord>
      <gx:coord>2.3004 48.8608 36.5</gx:coord>
      <gx:coord>2.3019 48.8617 37.0</gx:coord>
      <gx:coord>2.3032 48.8627 37.5</gx:coord>
    </gx:Track>
  </Placemark></Document>
</kml>"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(video) = args.next() else {
        anyhow::bail!("usage: overlay_job <video.mp4> [out.mp4]");
    };
    let out = args.next().unwrap_or_else(|| "overlay_out.mp4".to_string());

    let spec = JobSpec::new(&video, &out, TrackSource::KmlBytes(DEMO_KML.as_bytes().to_vec()));
    let scheduler = JobScheduler::new(SchedulerConfig::default());
    let handle = scheduler.submit(spec)?;

    for event in handle.events() {
        match event {
            JobEvent::Progress { percent, message: Some(m) } => println!("{percent:5.1}% {m}"),
            JobEvent::Progress { percent, message: None } => println!("{percent:5.1}%"),
            JobEvent::Log { stream, message } => println!("[{stream}] {message}"),
            JobEvent::Done { success } => println!("done (success: {success})"),
            JobEvent::Error { message } => println!("error: {message}"),
        }
    }

    if handle.state() == JobState::Done {
        eprintln!("wrote {out}");
    }
    Ok(())
}
