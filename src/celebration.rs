use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

/// Total length of one burst.
pub const BURST_DURATION: Duration = Duration::from_millis(2000);
/// Gap between two volleys.
pub const VOLLEY_INTERVAL: Duration = Duration::from_millis(250);
/// Particles per side in the first volley; later volleys shrink with the
/// time left.
const VOLLEY_SIZE: f64 = 50.0;
/// Fixed animation step, one frame of the event loop.
const FRAME_DT: f64 = 0.1;
const GRAVITY: f64 = 15.0;

const SYMBOLS: [char; 6] = ['*', '+', '•', '✦', '✧', '·'];

/// One confetti fleck.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl Particle {
    fn launch(x: f64, y: f64, drift: f64, rng: &mut impl Rng) -> Self {
        Self {
            x,
            y,
            vel_x: drift * rng.gen_range(1.0..4.0),
            vel_y: rng.gen_range(-9.0..-4.0),
            symbol: *SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += GRAVITY * dt;
        self.age += dt;
        self.age < self.max_age
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Confetti burst shown when a focus session is finished.
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    started: Option<Instant>,
    volleys_fired: u32,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            started: None,
            volleys_fired: 0,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.started.is_some() || !self.particles.is_empty()
    }

    /// Begin a burst now. A burst already in flight restarts.
    pub fn start(&mut self, width: u16, height: u16) {
        self.start_at(width, height, Instant::now());
    }

    pub fn start_at(&mut self, width: u16, height: u16, now: Instant) {
        self.particles.clear();
        self.started = Some(now);
        self.volleys_fired = 0;
        self.width = width.max(1) as f64;
        self.height = height.max(1) as f64;
        self.fire_due_volleys(now);
    }

    /// Advance one frame.
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    pub fn update_at(&mut self, now: Instant) {
        self.fire_due_volleys(now);

        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.update(FRAME_DT);
            let buffer = 5.0;
            let off_screen = p.y > height + buffer || p.x < -buffer || p.x > width + buffer;
            alive && !off_screen
        });
    }

    fn fire_due_volleys(&mut self, now: Instant) {
        let Some(started) = self.started else {
            return;
        };
        let elapsed = now.saturating_duration_since(started);
        if elapsed >= BURST_DURATION {
            self.started = None;
            return;
        }

        let due = (elapsed.as_millis() / VOLLEY_INTERVAL.as_millis()) as u32 + 1;
        let mut rng = rand::thread_rng();
        while self.volleys_fired < due {
            let at = VOLLEY_INTERVAL * self.volleys_fired;
            let count = volley_size(BURST_DURATION.saturating_sub(at));
            self.launch(Side::Left, count, &mut rng);
            self.launch(Side::Right, count, &mut rng);
            self.volleys_fired += 1;
        }
    }

    fn launch(&mut self, side: Side, count: usize, rng: &mut impl Rng) {
        let (lo, hi, drift) = match side {
            Side::Left => (0.1, 0.3, 1.0),
            Side::Right => (0.7, 0.9, -1.0),
        };
        for _ in 0..count {
            let x = self.width * rng.gen_range(lo..hi);
            let y = self.height * rng.gen_range(0.6..0.9);
            self.particles.push(Particle::launch(x, y, drift, rng));
        }
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}

/// Particles per side for a volley launched with `left` of the burst to go.
fn volley_size(left: Duration) -> usize {
    let share = left.as_secs_f64() / BURST_DURATION.as_secs_f64();
    (VOLLEY_SIZE * share).round().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn particle_physics() {
        let mut rng = rand::thread_rng();
        let mut particle = Particle::launch(10.0, 10.0, 1.0, &mut rng);
        let initial_vel_y = particle.vel_y;

        assert!(particle.update(0.1));
        assert!(particle.vel_y > initial_vel_y);
        assert!(particle.x > 10.0);
        assert!(particle.y < 10.0);
    }

    #[test]
    fn volley_sizes_decay() {
        assert_eq!(volley_size(BURST_DURATION), 50);
        assert!(volley_size(ms(1000)) < volley_size(ms(1750)));
        assert_eq!(volley_size(Duration::ZERO), 1);
    }

    #[test]
    fn first_volley_launches_from_both_sides() {
        let t0 = Instant::now();
        let mut celebration = Celebration::new();
        assert!(!celebration.is_active());

        celebration.start_at(100, 40, t0);
        assert!(celebration.is_active());
        assert_eq!(celebration.particles.len(), 100);

        let left = celebration.particles.iter().filter(|p| p.x < 50.0).count();
        let right = celebration.particles.iter().filter(|p| p.x >= 50.0).count();
        assert_eq!(left, 50);
        assert_eq!(right, 50);
        assert!(celebration
            .particles
            .iter()
            .all(|p| (10.0..30.0).contains(&p.x) || (70.0..90.0).contains(&p.x)));
    }

    #[test]
    fn volleys_follow_the_interval() {
        let t0 = Instant::now();
        let mut celebration = Celebration::new();
        celebration.start_at(100, 40, t0);

        celebration.update_at(t0 + ms(100));
        assert_eq!(celebration.volleys_fired, 1);
        celebration.update_at(t0 + ms(250));
        assert_eq!(celebration.volleys_fired, 2);
        // a late frame catches up on every missed volley
        celebration.update_at(t0 + ms(1100));
        assert_eq!(celebration.volleys_fired, 5);
        celebration.update_at(t0 + ms(1999));
        assert_eq!(celebration.volleys_fired, 8);
    }

    #[test]
    fn burst_ends_after_two_seconds() {
        let t0 = Instant::now();
        let mut celebration = Celebration::new();
        celebration.start_at(80, 24, t0);
        celebration.update_at(t0 + BURST_DURATION);
        let fired = celebration.volleys_fired;

        // no volleys after the burst; the remaining flecks age out
        for i in 0..40 {
            celebration.update_at(t0 + BURST_DURATION + ms(100 * i));
        }
        assert_eq!(celebration.volleys_fired, fired);
        assert!(celebration.particles.is_empty());
        assert!(!celebration.is_active());
    }

    #[test]
    fn restart_clears_previous_burst() {
        let t0 = Instant::now();
        let mut celebration = Celebration::new();
        celebration.start_at(80, 24, t0);
        celebration.update_at(t0 + ms(600));
        celebration.start_at(80, 24, t0 + ms(700));
        assert_eq!(celebration.volleys_fired, 1);
        assert_eq!(celebration.particles.len(), 100);
    }

    #[test]
    fn particles_removed_when_off_screen() {
        let t0 = Instant::now();
        let mut celebration = Celebration::new();
        celebration.start_at(20, 10, t0);
        let mut rng = rand::thread_rng();
        celebration
            .particles
            .push(Particle::launch(100.0, 100.0, 1.0, &mut rng));

        celebration.update_at(t0 + ms(10));
        assert!(celebration
            .particles
            .iter()
            .all(|p| p.x <= 25.0 && p.y <= 15.0 && p.x >= -5.0));
    }
}
