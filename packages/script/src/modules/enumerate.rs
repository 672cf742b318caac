//! `enum`: iteration helpers over lists and maps, written in Lua itself.
//!
//! Callbacks receive `(key, value)`; for lists the key is the 1-based index.

use mlua::{Lua, Table};

const SOURCE: &str = r#"
local is_list = function(t)
    local n = #t
    if n == 0 then return false end
    local count = 0
    for _ in pairs(t) do count = count + 1 end
    return count == n
end

local iterate = function(t)
    if is_list(t) then return ipairs(t) end
    return pairs(t)
end

local enum = {}

function enum.all(t, fn)
    for k, v in iterate(t) do
        if not fn(k, v) then return false end
    end
    return true
end

function enum.any(t, fn)
    for k, v in iterate(t) do
        if fn(k, v) then return true end
    end
    return false
end

function enum.each(t, fn)
    for k, v in iterate(t) do fn(k, v) end
end

function enum.map(t, fn)
    local out = {}
    if is_list(t) then
        for i, v in ipairs(t) do out[i] = fn(i, v) end
    else
        for k, v in pairs(t) do out[k] = fn(k, v) end
    end
    return out
end

function enum.filter(t, fn)
    local out = {}
    if is_list(t) then
        for i, v in ipairs(t) do
            if fn(i, v) then out[#out + 1] = v end
        end
    else
        for k, v in pairs(t) do
            if fn(k, v) then out[k] = v end
        end
    end
    return out
end

function enum.find(t, fn)
    for k, v in iterate(t) do
        if fn(k, v) then return v end
    end
    return nil
end

function enum.key(k, _) return k end
function enum.value(_, v) return v end

return enum
"#;

pub(crate) fn module(lua: &Lua) -> mlua::Result<Table> {
    lua.load(SOURCE).set_name("enum").eval()
}
