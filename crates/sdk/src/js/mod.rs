/// Leaderboard.
pub mod leaderboard;
