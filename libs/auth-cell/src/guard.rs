use shared_models::SessionState;

/// What the admin view should do for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAccess {
    /// Session not checked yet; show a "checking authentication" placeholder.
    Pending,
    Allow,
    RedirectToLogin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPageAccess {
    ShowLogin,
    RedirectToAdmin,
}

pub fn admin_gate(state: SessionState) -> AdminAccess {
    match state {
        SessionState::Unknown => AdminAccess::Pending,
        SessionState::Authenticated => AdminAccess::Allow,
        SessionState::Unauthenticated => AdminAccess::RedirectToLogin,
    }
}

pub fn login_gate(state: SessionState) -> LoginPageAccess {
    if state.is_authenticated() {
        LoginPageAccess::RedirectToAdmin
    } else {
        LoginPageAccess::ShowLogin
    }
}
