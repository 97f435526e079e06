use chrono::{DateTime, Utc};

/// 冷却检查结果; Denied 携带精确剩余秒数, 前端倒计时直接使用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownCheck {
    Allowed,
    Denied { seconds_remaining: i64 },
}

impl CooldownCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CooldownCheck::Allowed)
    }

    pub fn seconds_remaining(&self) -> i64 {
        match self {
            CooldownCheck::Allowed => 0,
            CooldownCheck::Denied { seconds_remaining } => *seconds_remaining,
        }
    }
}

/// 生效冷却 = 基础冷却 * 特权倍率
pub fn effective_cooldown_secs(base_cooldown_secs: i64, multiplier: f64) -> i64 {
    (base_cooldown_secs as f64 * multiplier).round() as i64
}

/// 纯函数冷却门: last_action_at 为 None 表示从未执行过, 直接放行。
/// 并发下存在 read-check-then-write 竞态, 调用方必须在提交带冷却的
/// 变更前、持有动作锁的情况下重新调用本函数。
pub fn check_cooldown(
    last_action_at: Option<DateTime<Utc>>,
    base_cooldown_secs: i64,
    multiplier: f64,
    now: DateTime<Utc>,
) -> CooldownCheck {
    let last = match last_action_at {
        None => return CooldownCheck::Allowed,
        Some(t) => t,
    };

    let effective = effective_cooldown_secs(base_cooldown_secs, multiplier);
    let elapsed = (now - last).num_seconds();

    if elapsed >= effective {
        CooldownCheck::Allowed
    } else {
        CooldownCheck::Denied {
            seconds_remaining: effective - elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_never_acted_is_allowed() {
        let now = Utc::now();
        assert!(check_cooldown(None, 300, 1.0, now).is_allowed());
    }

    #[test]
    fn test_denied_with_exact_remaining() {
        // 基础冷却 300s, 无 VIP, 100s 前搜索过 -> 剩余 200s
        let now = Utc::now();
        let last = now - Duration::seconds(100);
        let check = check_cooldown(Some(last), 300, 1.0, now);
        assert_eq!(check, CooldownCheck::Denied {
            seconds_remaining: 200
        });
    }

    #[test]
    fn test_vip_multiplier_applies() {
        // 相同输入 + VIP 0.5x -> 生效冷却 150s, 剩余 50s
        let now = Utc::now();
        let last = now - Duration::seconds(100);
        let check = check_cooldown(Some(last), 300, 0.5, now);
        assert_eq!(check, CooldownCheck::Denied {
            seconds_remaining: 50
        });
    }

    #[test]
    fn test_vip_plus_quarter_multiplier() {
        let now = Utc::now();
        let last = now - Duration::seconds(100);
        // 300 * 0.25 = 75s 已过 100s, 放行
        assert!(check_cooldown(Some(last), 300, 0.25, now).is_allowed());
    }

    #[test]
    fn test_monotonicity_across_window() {
        // 整个窗口内 0 < remaining <= effective_cd, 窗口结束后恒放行
        let now = Utc::now();
        let effective = effective_cooldown_secs(300, 0.5);
        for elapsed in 0..effective {
            let check = check_cooldown(Some(now - Duration::seconds(elapsed)), 300, 0.5, now);
            let remaining = check.seconds_remaining();
            assert!(remaining > 0 && remaining <= effective, "elapsed={elapsed}");
            assert_eq!(remaining, effective - elapsed);
        }
        for elapsed in effective..(effective + 100) {
            assert!(
                check_cooldown(Some(now - Duration::seconds(elapsed)), 300, 0.5, now).is_allowed()
            );
        }
    }

    #[test]
    fn test_boundary_exactly_elapsed() {
        let now = Utc::now();
        let last = now - Duration::seconds(300);
        assert!(check_cooldown(Some(last), 300, 1.0, now).is_allowed());
    }
}
