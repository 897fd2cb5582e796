use sky_strike::achievements::Achievements;
use sky_strike::entities::EnemyTier;

#[test]
fn milestone_unlocks_once() {
    let mut a = Achievements::default();
    assert!(a.check_milestones(999).is_empty());
    assert_eq!(a.check_milestones(1000), vec!["Rookie"]);
    assert!(a.check_milestones(1200).is_empty());
}

#[test]
fn big_jump_unlocks_several() {
    let mut a = Achievements::default();
    assert_eq!(a.check_milestones(12_000), vec!["Rookie", "Ace", "Sky Master"]);
}

#[test]
fn kills_are_tallied_per_tier() {
    let mut a = Achievements::default();
    a.record_kill(EnemyTier::Fighter);
    a.record_kill(EnemyTier::Fighter);
    a.record_kill(EnemyTier::Mothership);
    assert_eq!(a.kills(EnemyTier::Fighter), 2);
    assert_eq!(a.kills(EnemyTier::Bomber), 0);
    assert_eq!(a.total_kills(), 3);
}
