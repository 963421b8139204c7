//! Template engine for assembled documents and application pages.

use minijinja::{Environment, Value};

/// A saved page as listed in the application shell.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ShellPage {
    /// Page id
    pub id: String,
    /// Display title
    pub title: String,
    /// Creation time, already formatted
    pub created: String,
    /// Public link when published
    pub public_url: Option<String>,
}

/// Context for rendering the application shell.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ShellContext {
    /// Display name of the signed-in user
    pub user_name: Option<String>,
    /// Generator status label
    pub status: String,
    /// History, newest first
    pub pages: Vec<ShellPage>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a template engine with the built-in templates.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();

        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }

        Ok(Self { env })
    }

    /// Render a template with the given context.
    pub fn render(&self, template: &str, ctx: Value) -> Result<String, minijinja::Error> {
        self.env.get_template(template)?.render(ctx)
    }
}

const TEMPLATES: [(&str, &str); 6] = [
    ("base.html", BASE_TEMPLATE),
    ("preview.html", PREVIEW_TEMPLATE),
    ("export.html", EXPORT_TEMPLATE),
    ("viewer.html", VIEWER_TEMPLATE),
    ("unavailable.html", UNAVAILABLE_TEMPLATE),
    ("app.html", APP_TEMPLATE),
];

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{{ title }}</title>
  <script src="{{ tailwind_url | safe }}"></script>
  {% block head %}{% endblock %}
</head>
<body class="{% block body_class %}bg-white{% endblock %}">
{{ markup | safe }}
{% block scripts %}{% endblock %}
</body>
</html>"##;

const PREVIEW_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block head %}<style>
{{ style | safe }}
  </style>{% endblock %}

{% block scripts %}<script>
{{ script | safe }}
</script>{% endblock %}"##;

const EXPORT_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block head %}<link href="{{ font_url | safe }}" rel="stylesheet">
  <link rel="stylesheet" href="style.css">
  <style>
    body { font-family: 'Inter', sans-serif; }
  </style>{% endblock %}

{% block body_class %}font-sans antialiased text-gray-900 bg-white{% endblock %}

{% block scripts %}<script src="script.js"></script>{% endblock %}"##;

const VIEWER_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }}</title>
  <style>
    html, body { margin: 0; height: 100%; overflow: hidden; background: #fff; }
    iframe { width: 100%; height: 100%; border: 0; }
    .badge { position: fixed; right: 1rem; bottom: 1rem; padding: 0.375rem 0.75rem; border-radius: 9999px; background: rgba(255, 255, 255, 0.9); border: 1px solid #e5e7eb; font: 500 0.75rem system-ui, sans-serif; color: #6b7280; opacity: 0.5; transition: opacity 0.15s; }
    .badge:hover { opacity: 1; }
    .badge a { color: #4f46e5; margin-left: 0.25rem; }
  </style>
</head>
<body>
  <iframe srcdoc="{{ document }}" title="{{ title }}" sandbox="{{ sandbox }}"></iframe>
  <div class="badge">Made with Lumina<a href="{{ home_url }}">Create Yours</a></div>
</body>
</html>"##;

const UNAVAILABLE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Unavailable</title>
  <style>
    body { font-family: system-ui, sans-serif; background: #f9fafb; min-height: 100vh; margin: 0; display: flex; align-items: center; justify-content: center; }
    .card { background: #fff; max-width: 28rem; padding: 2rem; border-radius: 1rem; box-shadow: 0 10px 15px rgba(0, 0, 0, 0.1); text-align: center; }
    .card a { display: inline-block; padding: 0.5rem 1rem; border-radius: 0.375rem; background: #4f46e5; color: #fff; text-decoration: none; }
  </style>
</head>
<body>
  <div class="card">
    <h2>Unavailable</h2>
    <p>{{ message }}</p>
    <a href="{{ home_url }}">Create your own</a>
  </div>
</body>
</html>"##;

const APP_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Lumina</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 800px; margin: 2rem auto; padding: 0 1rem; background: #f8fafc; color: #0f172a; }
    header { display: flex; justify-content: space-between; align-items: center; }
    li { margin-bottom: 0.5rem; }
    code { background: #f1f5f9; padding: 0 0.25rem; border-radius: 0.25rem; }
  </style>
</head>
<body>
  <header>
    <h1>Lumina</h1>
    {% if user_name %}<span>{{ user_name }}</span>{% endif %}
  </header>
  <main>
  {% if not user_name %}
    <p>Sign in with <code>POST /api/auth/signin</code> or create an account with <code>POST /api/auth/signup</code>.</p>
  {% else %}
    <section>
      <h2>Build beautiful landing pages</h2>
      <p>Describe your page with <code>POST /api/generate</code>. Generator: {{ status }}</p>
    </section>
    <section>
      <h2>Saved Projects</h2>
      {% if pages %}
      <ul>
      {% for page in pages %}
        <li>
          <strong>{{ page.title }}</strong> <small>Created on {{ page.created }}</small>
          {% if page.public_url %}<a href="{{ page.public_url }}">View Live</a>{% endif %}
          <a href="/api/history/{{ page.id }}/export">Download</a>
        </li>
      {% endfor %}
      </ul>
      {% else %}
      <p>No saved projects yet.</p>
      {% endif %}
    </section>
  {% endif %}
  </main>
</body>
</html>"##;
