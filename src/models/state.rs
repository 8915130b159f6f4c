/// 会话状态机
///
/// `Loading`阶段在会话对象创建之前完成（失败即退出），因此这里只有会话存在之后的状态：
/// `Ready -> {Ready, Saving -> Ready | SaveFailed, AllLabeled}`
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Ready,
    Saving,
    SaveFailed(String), // 失败原因，显示给用户直到下一次操作
    AllLabeled,         // 终态：不再提供评分操作
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::AllLabeled)
    }

    /// 是否接受新的评分/导航操作
    pub fn accepts_actions(&self) -> bool {
        matches!(self, SessionPhase::Ready | SessionPhase::SaveFailed(_))
    }
}
