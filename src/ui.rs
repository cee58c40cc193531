use crate::config::Config;

pub fn render_index(config: &Config) -> String {
    INDEX_HTML
        .replace("{{YEAR}}", &config.year.to_string())
        .replace("{{GOAL}}", &config.step_goal.to_string())
        .replace("{{TIMEZONE}}", config.timezone.name())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Steps {{YEAR}}</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
      --level-0: #ebe6dc;
      --level-1: #ffd2c2;
      --level-2: #ffa98f;
      --level-3: #ff7f5e;
      --level-4: #d9472a;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1040px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
      animation: rise 600ms ease;
    }

    header {
      display: flex;
      flex-direction: column;
      gap: 6px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    h2 {
      margin: 0;
      font-size: 1.4rem;
    }

    .subtitle {
      margin: 0;
      color: #5f5c57;
      font-size: 1rem;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 8px;
    }

    .stat span {
      display: block;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .stat .value.accent {
      color: var(--accent);
    }

    .stat .detail {
      font-size: 0.85rem;
      color: #6f6a65;
    }

    .heatmap-card {
      background: white;
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      overflow-x: auto;
    }

    #heatmap rect {
      rx: 2;
    }

    #heatmap text {
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      fill: #7a746d;
      font-size: 10px;
    }

    .legend {
      display: flex;
      align-items: center;
      gap: 6px;
      font-size: 0.85rem;
      color: #6f6a65;
    }

    .legend i {
      width: 12px;
      height: 12px;
      border-radius: 3px;
      display: inline-block;
    }

    .banner {
      border-radius: 16px;
      padding: 14px 18px;
      font-size: 0.95rem;
      display: none;
    }

    .banner[data-state="empty"] {
      display: block;
      background: rgba(47, 72, 88, 0.08);
    }

    .banner[data-state="stale"],
    .banner[data-state="degraded"] {
      display: block;
      background: #fff1d6;
      color: #7a5200;
    }

    .banner[data-state="load_failed"] {
      display: block;
      background: #fde2dd;
      color: #c63b2b;
    }

    .months {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.95rem;
    }

    .months th,
    .months td {
      text-align: right;
      padding: 8px 10px;
      border-bottom: 1px solid rgba(47, 72, 88, 0.08);
    }

    .months th:first-child,
    .months td:first-child {
      text-align: left;
    }

    .hint {
      margin: 0;
      color: #6f6a65;
      font-size: 0.9rem;
    }

    @keyframes rise {
      from {
        opacity: 0;
        transform: translateY(18px);
      }
      to {
        opacity: 1;
        transform: translateY(0);
      }
    }

    @media (max-width: 600px) {
      .app {
        padding: 28px 22px;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Steps in {{YEAR}}</h1>
      <p class="subtitle" id="updated">Daily goal {{GOAL}} steps &middot; {{TIMEZONE}}</p>
    </header>

    <div class="banner" id="banner"></div>

    <section class="panel">
      <div class="stat">
        <span class="label">Total steps</span>
        <span class="value" id="total-steps">--</span>
        <span class="detail" id="total-km"></span>
      </div>
      <div class="stat">
        <span class="label">Daily average</span>
        <span class="value" id="daily-average">--</span>
        <span class="detail" id="days-recorded"></span>
      </div>
      <div class="stat">
        <span class="label">Current streak</span>
        <span class="value accent" id="current-streak">--</span>
        <span class="detail" id="longest-streak"></span>
      </div>
      <div class="stat">
        <span class="label">Goal adherence</span>
        <span class="value" id="consistency">--</span>
        <span class="detail" id="goal-days"></span>
      </div>
      <div class="stat">
        <span class="label">This week</span>
        <span class="value" id="week-total">--</span>
        <span class="detail" id="week-range"></span>
      </div>
      <div class="stat">
        <span class="label">Trend</span>
        <span class="value" id="trend">--</span>
        <span class="detail" id="trend-detail"></span>
      </div>
      <div class="stat">
        <span class="label">Best day</span>
        <span class="value" id="max-day">--</span>
        <span class="detail" id="max-day-date"></span>
      </div>
      <div class="stat">
        <span class="label">Year-end pace</span>
        <span class="value" id="projection">--</span>
        <span class="detail">Projected total</span>
      </div>
    </section>

    <section>
      <h2>Calendar</h2>
      <div class="heatmap-card">
        <svg id="heatmap" aria-label="Daily steps heatmap" role="img"></svg>
      </div>
      <div class="legend">
        <span>Less</span>
        <i style="background: var(--level-0)"></i>
        <i style="background: var(--level-1)"></i>
        <i style="background: var(--level-2)"></i>
        <i style="background: var(--level-3)"></i>
        <i style="background: var(--level-4)"></i>
        <span>More</span>
      </div>
    </section>

    <section>
      <h2>Months</h2>
      <table class="months">
        <thead>
          <tr><th>Month</th><th>Steps</th><th>km</th><th>Days</th><th>Best day</th></tr>
        </thead>
        <tbody id="months"></tbody>
      </table>
    </section>

    <p class="hint">Today is still in progress: it does not break the streak or count towards adherence until it ends.</p>
  </main>

  <script>
    const YEAR = {{YEAR}};
    const GOAL = {{GOAL}};
    const byId = (id) => document.getElementById(id);
    const fmt = (value, decimals = 0) =>
      typeof value === 'number' && !Number.isNaN(value)
        ? value.toLocaleString(undefined, { maximumFractionDigits: decimals, minimumFractionDigits: decimals })
        : '--';
    const plural = (n, word) => `${n} ${word}${n === 1 ? '' : 's'}`;

    const BANNERS = {
      empty: () => 'No data yet. The first sync has not stored any days.',
      stale: (data) => `Data may be out of date (last updated ${data.metadata && data.metadata.lastUpdated ? data.metadata.lastUpdated : 'never'}).`,
      degraded: (data) => `The last sync failed${data.message ? `: ${data.message}` : ''}. Showing the last good data.`,
      load_failed: (data) => `Could not load step data${data.message ? `: ${data.message}` : ''}.`
    };

    const setBanner = (data) => {
      const banner = byId('banner');
      const render = BANNERS[data.status];
      banner.dataset.state = render ? data.status : '';
      banner.textContent = render ? render(data) : '';
    };

    const level = (steps) => {
      if (!steps) return 0;
      if (steps < GOAL * 0.5) return 1;
      if (steps < GOAL) return 2;
      if (steps < GOAL * 1.5) return 3;
      return 4;
    };

    const isoDate = (date) =>
      `${date.getUTCFullYear()}-${String(date.getUTCMonth() + 1).padStart(2, '0')}-${String(date.getUTCDate()).padStart(2, '0')}`;

    const renderHeatmap = (series) => {
      const svg = byId('heatmap');
      const cell = 13;
      const gap = 3;
      const left = 28;
      const top = 18;
      const start = new Date(Date.UTC(YEAR, 0, 1));
      const end = new Date(Date.UTC(YEAR, 11, 31));
      const offset = (start.getUTCDay() + 6) % 7;
      const months = ['Jan', 'Feb', 'Mar', 'Apr', 'May', 'Jun', 'Jul', 'Aug', 'Sep', 'Oct', 'Nov', 'Dec'];

      let cells = '';
      let labels = '';
      for (let day = new Date(start); day <= end; day.setUTCDate(day.getUTCDate() + 1)) {
        const index = Math.round((day - start) / 86400000) + offset;
        const column = Math.floor(index / 7);
        const row = index % 7;
        const key = isoDate(day);
        const record = series[key];
        const steps = record ? record.steps : 0;
        const x = left + column * (cell + gap);
        const y = top + row * (cell + gap);
        const title = record ? `${key}: ${fmt(steps)} steps, ${fmt(record.km, 1)} km` : `${key}: no data`;
        cells += `<rect x="${x}" y="${y}" width="${cell}" height="${cell}" fill="var(--level-${level(steps)})"><title>${title}</title></rect>`;
        if (day.getUTCDate() === 1) {
          labels += `<text x="${x}" y="${top - 6}">${months[day.getUTCMonth()]}</text>`;
        }
      }
      ['Mon', 'Wed', 'Fri'].forEach((name, i) => {
        labels += `<text x="0" y="${top + (i * 2) * (cell + gap) + cell - 2}">${name}</text>`;
      });

      const width = left + 54 * (cell + gap);
      const height = top + 7 * (cell + gap);
      svg.setAttribute('viewBox', `0 0 ${width} ${height}`);
      svg.setAttribute('width', width);
      svg.setAttribute('height', height);
      svg.innerHTML = labels + cells;
    };

    const renderStats = (stats) => {
      byId('total-steps').textContent = fmt(stats.total_steps);
      byId('total-km').textContent = `${fmt(stats.total_km, 1)} km`;
      byId('daily-average').textContent = fmt(stats.daily_average_steps);
      byId('days-recorded').textContent = `over ${plural(stats.days_recorded, 'day')}`;
      byId('current-streak').textContent = plural(stats.current_streak.length, 'day');
      byId('longest-streak').textContent = `Longest: ${plural(stats.longest_streak.length, 'day')}`;
      byId('consistency').textContent = `${fmt(stats.consistency * 100, 1)}%`;
      byId('goal-days').textContent = `${stats.days_with_goal} of ${stats.elapsed_days} days`;
      byId('week-total').textContent = fmt(stats.week.total_steps);
      byId('week-range').textContent = `${stats.week.week_start} to ${stats.week.week_end}`;
      byId('trend').textContent = stats.trend.direction;
      byId('trend-detail').textContent = `${stats.trend.change_percent >= 0 ? '+' : ''}${fmt(stats.trend.change_percent, 1)}% vs previous 7 days`;
      byId('max-day').textContent = stats.max_day ? fmt(stats.max_day.steps) : '--';
      byId('max-day-date').textContent = stats.max_day ? stats.max_day.date : '';
      byId('projection').textContent = fmt(stats.projected_year_total);

      byId('months').innerHTML = Object.entries(stats.monthly_totals)
        .map(([month, total]) => `<tr><td>${month}</td><td>${fmt(total.steps)}</td><td>${fmt(total.km, 1)}</td><td>${total.days}</td><td>${total.max_day} (${fmt(total.max_steps)})</td></tr>`)
        .join('');
    };

    const load = async () => {
      const res = await fetch('/api/dashboard');
      if (!res.ok) {
        throw new Error('Unable to load dashboard');
      }
      const data = await res.json();
      setBanner(data);
      renderHeatmap(data.series || {});
      if (data.stats) {
        renderStats(data.stats);
      }
      if (data.metadata && data.metadata.lastUpdated) {
        byId('updated').textContent += ` · updated ${data.metadata.lastUpdated}`;
      }
    };

    load().catch((err) => setBanner({ status: 'load_failed', message: err.message }));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_filled() {
        let config = Config::from_lookup(|key| match key {
            "SERIES_START_DATE" => Some("2026-01-01".to_string()),
            "STEP_GOAL" => Some("12000".to_string()),
            "TIMEZONE" => Some("Europe/Berlin".to_string()),
            _ => None,
        })
        .unwrap();

        let html = render_index(&config);
        assert!(html.contains("const YEAR = 2026;"));
        assert!(html.contains("const GOAL = 12000;"));
        assert!(html.contains("Europe/Berlin"));
        assert!(!html.contains("{{"));
    }
}
