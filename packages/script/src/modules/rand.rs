//! `rand`: random numbers and identifiers.

use mlua::{Lua, Table};
use rand::Rng;

pub(crate) fn module(lua: &Lua) -> mlua::Result<Table> {
    let m = lua.create_table()?;
    m.set("int", lua.create_function(|_, ()| Ok(rand::thread_rng().gen::<i64>()))?)?;
    m.set("float", lua.create_function(|_, ()| Ok(rand::thread_rng().gen::<f64>()))?)?;
    m.set(
        "intn",
        lua.create_function(|_, n: i64| {
            if n <= 0 {
                return Err(mlua::Error::RuntimeError(format!(
                    "intn: argument must be positive, got {n}"
                )));
            }
            Ok(rand::thread_rng().gen_range(0..n))
        })?,
    )?;
    m.set(
        "uuid",
        lua.create_function(|_, ()| Ok(uuid::Uuid::new_v4().to_string()))?,
    )?;
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_in_range() {
        let lua = Lua::new();
        lua.globals().set("rand", module(&lua).unwrap()).unwrap();
        let ok: bool = lua
            .load(r#"
                for _ = 1, 100 do
                    local n = rand.intn(5)
                    local f = rand.float()
                    if n < 0 or n >= 5 or f < 0 or f >= 1 then return false end
                end
                return #rand.uuid() == 36
            "#)
            .eval()
            .unwrap();
        assert!(ok);
        assert!(lua.load("rand.intn(0)").exec().is_err());
    }
}
