//! Viewer module - generates the embedded HTML page for scrubbing through a
//! study's frames with window/level and cine playback controls.

use crate::format::DicomDataset;

/// Escape HTML special characters to prevent XSS attacks.
fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Generate an HTML page for viewing a study's frames.
///
/// The page fetches frames from `/frames/{study_id}/{index}.png`, re-rendering
/// with `center`/`width` query parameters when the window sliders move. Cine
/// playback advances the frame index every `playback_interval_ms` and wraps
/// at the end.
///
/// # Arguments
///
/// * `study_id` - The study identifier (will be URL-encoded in frame URLs)
/// * `dataset` - Parsed dataset providing geometry and the default window
/// * `playback_interval_ms` - Cine interval between frames
pub fn render_viewer_html(
    study_id: &str,
    dataset: &DicomDataset,
    playback_interval_ms: u64,
) -> String {
    let encoded_study_id = urlencoding::encode(study_id);
    let escaped_study_id = html_escape(study_id);
    let escaped_syntax = html_escape(dataset.transfer_syntax.name());

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>DICOM Viewer - {escaped_study_id}</title>
    <style>
        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}
        body {{
            background: #0f0f0f;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            color: #fff;
            display: flex;
            flex-direction: column;
            height: 100vh;
            overflow: hidden;
        }}
        #stage {{
            flex: 1;
            display: flex;
            align-items: center;
            justify-content: center;
            min-height: 0;
        }}
        #frame {{
            max-width: 100%;
            max-height: 100%;
            image-rendering: pixelated;
        }}
        .info-panel {{
            position: absolute;
            top: 16px;
            left: 16px;
            background: rgba(0, 0, 0, 0.85);
            padding: 16px 20px;
            border-radius: 8px;
            font-size: 13px;
            line-height: 1.5;
            backdrop-filter: blur(10px);
            border: 1px solid rgba(255, 255, 255, 0.1);
            max-width: 320px;
            z-index: 1000;
        }}
        .info-panel h2 {{
            font-size: 14px;
            font-weight: 600;
            margin-bottom: 8px;
            word-break: break-all;
        }}
        .info-panel .meta {{
            color: rgba(255, 255, 255, 0.7);
            font-size: 12px;
        }}
        .info-panel .meta span {{
            color: rgba(255, 255, 255, 0.9);
        }}
        .info-panel .syntax-badge {{
            display: inline-block;
            background: rgba(99, 102, 241, 0.2);
            color: #818cf8;
            padding: 2px 8px;
            border-radius: 4px;
            font-size: 11px;
            font-weight: 500;
            margin-top: 8px;
        }}
        .controls {{
            background: rgba(0, 0, 0, 0.85);
            border-top: 1px solid rgba(255, 255, 255, 0.1);
            padding: 12px 20px;
            display: flex;
            flex-wrap: wrap;
            align-items: center;
            gap: 16px;
            font-size: 12px;
        }}
        .controls label {{
            color: rgba(255, 255, 255, 0.7);
            display: flex;
            align-items: center;
            gap: 6px;
        }}
        .controls input[type="range"] {{
            width: 160px;
        }}
        .controls select, .controls button {{
            background: #1f1f1f;
            color: #fff;
            border: 1px solid rgba(255, 255, 255, 0.2);
            border-radius: 4px;
            padding: 4px 10px;
            font-size: 12px;
            cursor: pointer;
        }}
        .controls button:hover {{
            background: #2a2a2a;
        }}
        #frame-label {{
            min-width: 72px;
            color: rgba(255, 255, 255, 0.9);
        }}
        .error-banner {{
            position: absolute;
            top: 0;
            left: 0;
            right: 0;
            background: rgba(220, 38, 38, 0.95);
            color: white;
            padding: 12px 20px;
            font-size: 14px;
            z-index: 1000;
            display: none;
        }}
        .error-banner.visible {{
            display: block;
        }}
    </style>
</head>
<body>
    <div id="error-banner" class="error-banner">
        <strong>Failed to load frame</strong>
        <div id="error-details"></div>
    </div>

    <div class="info-panel">
        <h2>{escaped_study_id}</h2>
        <div class="meta">
            <span>{width}</span> x <span>{height}</span> px<br>
            <span>{frame_count}</span> frames, <span>{bits_allocated}</span>-bit<br>
            Default window: <span>{window_center}</span> / <span>{window_width}</span>
        </div>
        <div class="syntax-badge">{escaped_syntax}</div>
    </div>

    <div id="stage">
        <img id="frame" alt="frame">
    </div>

    <div class="controls">
        <button id="play-btn">Play</button>
        <label>Frame
            <input type="range" id="frame-slider" min="0" max="{max_index}" value="0" step="1">
        </label>
        <span id="frame-label">1 / {frame_count}</span>
        <label>Center
            <input type="range" id="center-slider" min="{center_min}" max="{center_max}" value="{window_center}" step="1">
        </label>
        <label>Width
            <input type="range" id="width-slider" min="1" max="{width_max}" value="{window_width}" step="1">
        </label>
        <label>Preset
            <select id="preset-select">
                <option value="">Custom</option>
                <option value="soft-tissue">Soft tissue</option>
                <option value="bone">Bone</option>
                <option value="lung">Lung</option>
                <option value="calibration">Calibration</option>
            </select>
        </label>
        <button id="reset-btn">Reset window</button>
    </div>

    <script>
        const frameCount = {frame_count};
        const defaultCenter = {window_center};
        const defaultWidth = {window_width};
        const frameBase = "/frames/{encoded_study_id}/";
        const playbackIntervalMs = {playback_interval_ms};

        const frameImg = document.getElementById('frame');
        const frameSlider = document.getElementById('frame-slider');
        const frameLabel = document.getElementById('frame-label');
        const centerSlider = document.getElementById('center-slider');
        const widthSlider = document.getElementById('width-slider');
        const presetSelect = document.getElementById('preset-select');
        const playBtn = document.getElementById('play-btn');
        const resetBtn = document.getElementById('reset-btn');

        let currentIndex = 0;
        let playing = false;
        let playTimer = null;

        function frameUrl(index) {{
            let url = frameBase + index + ".png";
            const preset = presetSelect.value;
            if (preset) {{
                url += "?preset=" + encodeURIComponent(preset);
            }} else {{
                const center = Number(centerSlider.value);
                const width = Number(widthSlider.value);
                if (center !== defaultCenter || width !== defaultWidth) {{
                    url += "?center=" + center + "&width=" + width;
                }}
            }}
            return url;
        }}

        function showFrame(index) {{
            currentIndex = ((index % frameCount) + frameCount) % frameCount;
            frameImg.src = frameUrl(currentIndex);
            frameSlider.value = currentIndex;
            frameLabel.textContent = (currentIndex + 1) + " / " + frameCount;
        }}

        frameImg.addEventListener('error', function() {{
            const banner = document.getElementById('error-banner');
            document.getElementById('error-details').textContent =
                'Frame ' + currentIndex + ' failed to load. Check the server log for details.';
            banner.classList.add('visible');
            stopPlayback();
        }});
        frameImg.addEventListener('load', function() {{
            document.getElementById('error-banner').classList.remove('visible');
        }});

        function startPlayback() {{
            if (playing || frameCount < 2) return;
            playing = true;
            playBtn.textContent = 'Pause';
            playTimer = setInterval(function() {{
                showFrame(currentIndex + 1);
            }}, playbackIntervalMs);
        }}

        function stopPlayback() {{
            if (!playing) return;
            playing = false;
            playBtn.textContent = 'Play';
            clearInterval(playTimer);
            playTimer = null;
        }}

        playBtn.addEventListener('click', function() {{
            if (playing) {{ stopPlayback(); }} else {{ startPlayback(); }}
        }});

        frameSlider.addEventListener('input', function() {{
            stopPlayback();
            showFrame(Number(frameSlider.value));
        }});

        function onWindowChange() {{
            presetSelect.value = "";
            showFrame(currentIndex);
        }}
        centerSlider.addEventListener('change', onWindowChange);
        widthSlider.addEventListener('change', onWindowChange);

        presetSelect.addEventListener('change', function() {{
            showFrame(currentIndex);
        }});

        resetBtn.addEventListener('click', function() {{
            centerSlider.value = defaultCenter;
            widthSlider.value = defaultWidth;
            presetSelect.value = "";
            showFrame(currentIndex);
        }});

        document.addEventListener('keydown', function(e) {{
            if (e.key === 'ArrowRight') {{
                stopPlayback();
                showFrame(currentIndex + 1);
            }} else if (e.key === 'ArrowLeft') {{
                stopPlayback();
                showFrame(currentIndex - 1);
            }} else if (e.key === ' ') {{
                e.preventDefault();
                if (playing) {{ stopPlayback(); }} else {{ startPlayback(); }}
            }}
        }});

        showFrame(0);
    </script>
</body>
</html>"##,
        escaped_study_id = escaped_study_id,
        escaped_syntax = escaped_syntax,
        width = dataset.width(),
        height = dataset.height(),
        frame_count = dataset.frame_count,
        max_index = dataset.frame_count.saturating_sub(1),
        bits_allocated = dataset.bits_allocated,
        window_center = dataset.window_center.round() as i64,
        window_width = dataset.window_width.round().max(1.0) as i64,
        center_min = slider_center_bounds(dataset).0,
        center_max = slider_center_bounds(dataset).1,
        width_max = slider_width_max(dataset),
        encoded_study_id = encoded_study_id,
        playback_interval_ms = playback_interval_ms,
    )
}

/// Slider bounds for the window center, covering the full signed or unsigned
/// sample range of the study's bit depth.
fn slider_center_bounds(dataset: &DicomDataset) -> (i64, i64) {
    let bits = u32::from(dataset.bits_allocated.clamp(1, 16));
    if dataset.signed {
        let half = 1i64 << (bits - 1);
        (-half, half - 1)
    } else {
        (0, (1i64 << bits) - 1)
    }
}

/// Slider maximum for the window width: the span of the sample range.
fn slider_width_max(dataset: &DicomDataset) -> i64 {
    let bits = u32::from(dataset.bits_allocated.clamp(1, 16));
    1i64 << bits
}
