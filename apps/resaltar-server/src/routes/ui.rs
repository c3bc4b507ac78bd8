//! Demo page
//!
//! A single inline page wiring the document API together: upload, phrase
//! search with a debounce, a cursor-position slider, and the embedded
//! viewer showing the displayed document.

use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>resaltar</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 2rem; display: flex; flex-direction: column; gap: 1rem; }
  .controls { display: flex; flex-direction: column; gap: 0.5rem; max-width: 28rem; }
  embed { width: 100%; height: 70vh; border: 1px solid #ccc; }
  #status { color: #555; }
</style>
</head>
<body>
  <h1>resaltar</h1>
  <div class="controls">
    <input id="file" type="file" accept="application/pdf">
    <input id="phrase" type="text" placeholder="Search phrase" disabled>
    <label>Cursor position: <span id="position-label">0</span>
      <input id="position" type="range" min="0" max="0" value="0" disabled>
    </label>
    <div id="status">No document loaded.</div>
  </div>
  <embed id="viewer" type="application/pdf" hidden>

<script>
const fileInput = document.getElementById('file');
const phraseInput = document.getElementById('phrase');
const positionInput = document.getElementById('position');
const positionLabel = document.getElementById('position-label');
const statusLine = document.getElementById('status');
const viewer = document.getElementById('viewer');

let pollTimer = null;

function refreshViewer() {
  viewer.hidden = false;
  viewer.src = '/api/v1/document/view?ts=' + Date.now();
}

function debounce(fn, ms) {
  let timer = null;
  return (...args) => {
    if (timer) clearTimeout(timer);
    timer = setTimeout(() => fn(...args), ms);
  };
}

async function pollStatus() {
  const response = await fetch('/api/v1/document/status');
  const body = await response.json();
  if (body.status === 'ready') {
    clearInterval(pollTimer);
    pollTimer = null;
    statusLine.textContent = 'Ready: ' + body.pages + ' page(s), ' +
      body.maxPosition + ' characters (ocr took ' + body.ocrDurationMs + ' ms)';
    phraseInput.disabled = false;
    positionInput.disabled = false;
    positionInput.max = Math.max(body.maxPosition - 1, 0);
    refreshViewer();
  } else if (body.status === 'ocr-preprocessing') {
    statusLine.textContent = 'Running OCR...';
  } else {
    clearInterval(pollTimer);
    pollTimer = null;
    statusLine.textContent = body.error ? 'OCR failed: ' + body.error : 'No document loaded.';
  }
}

fileInput.addEventListener('change', async () => {
  const file = fileInput.files[0];
  if (!file) return;
  const form = new FormData();
  form.append('file', file);
  statusLine.textContent = 'Uploading...';
  phraseInput.disabled = true;
  positionInput.disabled = true;
  const response = await fetch('/api/v1/document', { method: 'POST', body: form });
  if (!response.ok) {
    const body = await response.json();
    statusLine.textContent = 'Upload failed: ' + body.message;
    return;
  }
  refreshViewer();
  if (pollTimer) clearInterval(pollTimer);
  pollTimer = setInterval(pollStatus, 1000);
});

const runSearch = debounce(async () => {
  const phrase = phraseInput.value;
  const response = await fetch('/api/v1/document/search?phrase=' + encodeURIComponent(phrase));
  if (response.ok) {
    const body = await response.json();
    statusLine.textContent = body.matches + ' match(es) in ' + body.durationMs + ' ms';
    refreshViewer();
  } else {
    const body = await response.json();
    statusLine.textContent = 'Search failed: ' + body.message;
  }
}, 500);
phraseInput.addEventListener('input', runSearch);

const runSeek = debounce(async () => {
  const position = positionInput.value;
  const response = await fetch('/api/v1/document/seek?position=' + position);
  if (response.ok) {
    const body = await response.json();
    if (body.resolved) {
      statusLine.textContent = 'Paragraph ' + body.start + '-' + body.end +
        ' on page ' + (body.page + 1);
      refreshViewer();
    } else {
      statusLine.textContent = 'No paragraph at position ' + position;
    }
  }
}, 200);
positionInput.addEventListener('input', () => {
  positionLabel.textContent = positionInput.value;
  runSeek();
});
</script>
</body>
</html>
"##;
