use axum::response::Html;

/// GET / - the single upload view.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Exam Score Reader</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            background: linear-gradient(135deg, #dbeafe 0%, #e0e7ff 100%);
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 16px;
        }

        .container {
            background: white;
            border-radius: 16px;
            box-shadow: 0 20px 40px rgba(0,0,0,0.12);
            max-width: 448px;
            width: 100%;
            padding: 32px;
        }

        h1 {
            color: #1f2937;
            font-size: 1.9em;
            text-align: center;
            margin-bottom: 24px;
        }

        h2 {
            color: #1f2937;
            font-size: 1.4em;
            text-align: center;
            margin: 32px 0 16px;
        }

        .upload-area {
            position: relative;
            border: 2px dashed #d1d5db;
            border-radius: 10px;
            padding: 16px;
            text-align: center;
            transition: border-color 0.3s;
        }

        .upload-area:hover {
            border-color: #3b82f6;
        }

        .upload-area input[type="file"] {
            position: absolute;
            inset: 0;
            width: 100%;
            height: 100%;
            opacity: 0;
            cursor: pointer;
        }

        .upload-hint {
            color: #4b5563;
            font-size: 0.9em;
            padding: 32px 0;
        }

        .preview-image {
            display: none;
            max-width: 200px;
            max-height: 200px;
            margin: 0 auto;
            border-radius: 10px;
        }

        button {
            width: 100%;
            margin-top: 24px;
            background: #3b82f6;
            color: white;
            border: none;
            padding: 10px 16px;
            border-radius: 10px;
            font-size: 1em;
            cursor: pointer;
            transition: background 0.3s;
        }

        button:hover {
            background: #2563eb;
        }

        button:disabled {
            background: #d1d5db;
            cursor: not-allowed;
        }

        .scores {
            display: none;
        }

        .score-list {
            background: #f9fafb;
            border-radius: 10px;
            padding: 16px;
        }

        .score-row {
            display: flex;
            justify-content: space-between;
            padding: 8px 0;
            border-bottom: 1px solid #e5e7eb;
        }

        .score-row:last-child {
            border-bottom: none;
        }

        .question {
            color: #374151;
            font-weight: 500;
        }

        .score {
            color: #2563eb;
            font-weight: 700;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>Exam Score Reader</h1>

        <form id="uploadForm">
            <div class="upload-area">
                <input type="file" id="fileInput" accept="image/*">
                <img id="previewImage" class="preview-image" alt="Preview">
                <div class="upload-hint" id="uploadHint">Click or drag an exam sheet here</div>
            </div>
            <button type="submit" id="submitButton" disabled>Read Scores</button>
        </form>

        <div class="scores" id="scores">
            <h2>Exam Scores</h2>
            <div class="score-list" id="scoreList"></div>
        </div>
    </div>

    <script>
        const form = document.getElementById('uploadForm');
        const fileInput = document.getElementById('fileInput');
        const previewImage = document.getElementById('previewImage');
        const uploadHint = document.getElementById('uploadHint');
        const submitButton = document.getElementById('submitButton');
        const scores = document.getElementById('scores');
        const scoreList = document.getElementById('scoreList');

        let selectedImage = null;
        let isLoading = false;

        function render() {
            submitButton.disabled = !selectedImage || isLoading;
            submitButton.textContent = isLoading ? 'Processing...' : 'Read Scores';
        }

        function showScores(mapping) {
            scoreList.replaceChildren();
            if (!mapping) {
                scores.style.display = 'none';
                return;
            }
            for (const [question, score] of Object.entries(mapping)) {
                const row = document.createElement('div');
                row.className = 'score-row';
                const label = document.createElement('span');
                label.className = 'question';
                label.textContent = 'Question ' + question;
                const value = document.createElement('span');
                value.className = 'score';
                value.textContent = typeof score === 'string' ? score : JSON.stringify(score);
                row.append(label, value);
                scoreList.append(row);
            }
            scores.style.display = 'block';
        }

        fileInput.addEventListener('change', (e) => {
            const file = e.target.files && e.target.files[0];
            if (!file) {
                return;
            }
            selectedImage = file;
            previewImage.src = URL.createObjectURL(file);
            previewImage.style.display = 'block';
            uploadHint.style.display = 'none';
            render();
        });

        form.addEventListener('submit', async (e) => {
            e.preventDefault();
            if (!selectedImage || isLoading) {
                return;
            }

            isLoading = true;
            render();

            const formData = new FormData();
            formData.append('image', selectedImage);

            try {
                const res = await fetch('/api/upload', {
                    method: 'POST',
                    body: formData
                });

                if (!res.ok) {
                    throw new Error('Image upload failed');
                }

                const data = await res.json();
                if (data.success && data.result) {
                    const cleanJson = data.result.replace(/^```json/, '').replace(/```$/, '').trim();
                    showScores(JSON.parse(cleanJson));
                } else {
                    throw new Error('Invalid response format');
                }
            } catch (error) {
                console.error('Error:', error);
                showScores(null);
                alert(error instanceof Error ? error.message : 'An unknown error occurred');
            } finally {
                isLoading = false;
                render();
            }
        });
    </script>
</body>
</html>
"#;
