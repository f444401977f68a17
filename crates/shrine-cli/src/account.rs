use shrine_client::{CartContext, MergeReport};

pub(crate) async fn login(ctx: &CartContext, email: &str, password: &str) -> anyhow::Result<()> {
    let (session, report) = ctx.login(email, password).await?;
    println!("Signed in as {} ({})", session.display_name(), session.role);
    print_merge(report);
    Ok(())
}

pub(crate) async fn register(
    ctx: &CartContext,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let (session, report) = ctx.register(name, email, password).await?;
    println!("Welcome, {}", session.display_name());
    print_merge(report);
    Ok(())
}

pub(crate) async fn logout(ctx: &CartContext) -> anyhow::Result<()> {
    ctx.logout().await?;
    println!("Signed out");
    Ok(())
}

pub(crate) fn whoami(ctx: &CartContext) {
    match ctx.state().session() {
        Some(session) => {
            println!("{} <{}>", session.display_name(), session.email.as_deref().unwrap_or("-"));
            println!("role: {}", session.role);
            if session.can_access_admin() {
                println!("admin console: allowed");
            }
        }
        None => println!("Browsing as guest"),
    }
}

fn print_merge(report: MergeReport) {
    if report.attempted == 0 {
        return;
    }
    println!(
        "Moved {} of {} guest cart item(s) into your cart",
        report.merged(),
        report.attempted
    );
    if report.failed > 0 {
        println!("{} item(s) could not be added and were dropped", report.failed);
    }
}
