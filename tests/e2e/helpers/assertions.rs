use piper_stream_server::domain::protocol::ServerEvent;

/// Short label per event, audio chunks collapsed to `chunk`
pub fn labels(events: &[ServerEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| match event {
            ServerEvent::Info(_) => "info",
            ServerEvent::AudioStart { .. } => "start",
            ServerEvent::AudioChunk { .. } => "chunk",
            ServerEvent::AudioStop => "stop",
            ServerEvent::SynthesizeStopped => "stopped",
            ServerEvent::Error { .. } => "error",
        })
        .collect()
}

/// Labels with runs of chunks squashed into one `chunk`
pub fn shape(events: &[ServerEvent]) -> Vec<&'static str> {
    let mut shape = labels(events);
    shape.dedup_by(|a, b| *a == "chunk" && *b == "chunk");
    shape
}

/// Concatenated payload of every audio chunk
pub fn pcm(events: &[ServerEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::AudioChunk { audio, .. } => Some(audio.as_slice()),
            _ => None,
        })
        .flatten()
        .copied()
        .collect()
}

pub fn assert_error_code(events: &[ServerEvent], expected_code: &str) {
    let codes: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::Error { code, .. } => Some(code.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(
        codes,
        vec![expected_code],
        "Expected exactly one {} error in {:?}",
        expected_code,
        labels(events)
    );
    assert!(
        matches!(events.last(), Some(ServerEvent::Error { .. })),
        "Error must be the last event"
    );
}

/// Every chunk of a sub-stream carries the format announced by its start
pub fn assert_consistent_formats(events: &[ServerEvent]) {
    let mut current = None;
    for event in events {
        match event {
            ServerEvent::AudioStart {
                rate,
                width,
                channels,
            } => current = Some((*rate, *width, *channels)),
            ServerEvent::AudioChunk {
                rate,
                width,
                channels,
                ..
            } => assert_eq!(current, Some((*rate, *width, *channels))),
            ServerEvent::AudioStop => current = None,
            _ => {}
        }
    }
}
