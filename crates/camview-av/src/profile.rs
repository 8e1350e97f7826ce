//! Low-latency fragmented MP4 transcode profile.
//!
//! The argument list is fixed: H.264 with the fastest preset and zero-latency
//! tuning, a closed 24-frame GOP with scene-cut detection disabled, no audio,
//! and fragmented MP4 written to stdout so a browser can start playback from
//! the first fragment.

use camview_common::StreamEndpoint;

/// Keyframe interval, in frames.
pub const GOP_FRAMES: u32 = 24;

/// `-movflags` value for progressive fragmented MP4 delivery.
pub const FRAGMENT_FLAGS: &str = "frag_keyframe+empty_moov+default_base_moof";

/// Content type of the transcoder output.
pub const OUTPUT_CONTENT_TYPE: &str = "video/mp4";

/// Build the transcoder argument list for `endpoint`.
pub fn transcode_args(endpoint: &StreamEndpoint) -> Vec<String> {
    let gop = GOP_FRAMES.to_string();
    let mut args: Vec<String> = Vec::with_capacity(32);

    // Interleave RTP on the RTSP control connection.
    if endpoint.scheme.is_rtsp_family() {
        args.extend(["-rtsp_transport", "tcp"].map(String::from));
    }

    args.push("-i".into());
    args.push(endpoint.url.clone());

    args.extend(
        [
            "-c:v", "libx264",
            "-preset", "ultrafast",
            "-tune", "zerolatency",
            "-pix_fmt", "yuv420p",
            "-g", gop.as_str(),
            "-keyint_min", gop.as_str(),
            "-sc_threshold", "0",
            "-an",
            "-f", "mp4",
            "-movflags", FRAGMENT_FLAGS,
            "pipe:1",
        ]
        .map(String::from),
    );

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use camview_common::resolve;

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn rtsp_forces_tcp_transport_before_input() {
        let ep = resolve("rtsp://10.0.0.5/stream").unwrap();
        let args = transcode_args(&ep);
        assert_eq!(&args[..4], ["-rtsp_transport", "tcp", "-i", "rtsp://10.0.0.5/stream"]);
    }

    #[test]
    fn http_source_has_no_transport_flag() {
        let ep = resolve("http://192.168.0.175:8080/video").unwrap();
        let args = transcode_args(&ep);
        assert!(!args.iter().any(|a| a == "-rtsp_transport"));
        assert_eq!(value_after(&args, "-i"), Some("http://192.168.0.175:8080/video"));
    }

    #[test]
    fn low_latency_video_only_profile() {
        let ep = resolve("rtsp://10.0.0.5/stream").unwrap();
        let args = transcode_args(&ep);
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-preset"), Some("ultrafast"));
        assert_eq!(value_after(&args, "-tune"), Some("zerolatency"));
        assert_eq!(value_after(&args, "-g"), Some("24"));
        assert_eq!(value_after(&args, "-keyint_min"), Some("24"));
        assert_eq!(value_after(&args, "-sc_threshold"), Some("0"));
        assert!(args.iter().any(|a| a == "-an"));
    }

    #[test]
    fn fragmented_mp4_to_stdout() {
        let ep = resolve("https://cam.local/live.m3u8").unwrap();
        let args = transcode_args(&ep);
        assert_eq!(value_after(&args, "-f"), Some("mp4"));
        assert_eq!(value_after(&args, "-movflags"), Some(FRAGMENT_FLAGS));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }
}
